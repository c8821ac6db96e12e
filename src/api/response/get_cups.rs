use serde::Deserialize;

#[derive(Deserialize)]
pub struct Cups {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Provisioning_address__c", default)]
    pub provisioning_address: String,
    #[serde(rename = "ButtonLink", default)]
    pub button_link: String,
}

#[derive(Deserialize)]
pub struct Data {
    #[serde(rename = "lstCups")]
    pub lst_cups: Vec<Cups>,
}

#[derive(Deserialize)]
pub struct GetCups {
    pub data: Data,
}
