use serde::Deserialize;

#[derive(Deserialize)]
pub struct Values {
    #[serde(default)]
    pub url: String,
}

#[derive(Deserialize)]
pub struct Attributes {
    pub values: Values,
}

#[derive(Deserialize)]
pub struct Event {
    #[serde(default)]
    pub descriptor: String,
    pub attributes: Attributes,
}

/* Answer to the login action: a list of client-side events, the first one redirects */
#[derive(Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub events: Vec<Event>,
}
