use serde::Deserialize;

#[derive(Deserialize)]
pub struct Visibility {
    #[serde(rename = "Id", default)]
    pub id: String,
}

#[derive(Deserialize)]
pub struct GetLoginInfo {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    pub visibility: Visibility,
}
