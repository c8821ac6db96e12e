use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub potencia_actual: f64,
    pub potencia_contratada: f64,
    #[serde(rename = "percent", default)]
    pub percentage: String,
    #[serde(rename = "estadoICP", default)]
    pub estado_icp: String,
    #[serde(default)]
    pub totalizador: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultarContador {
    pub data: Data,
    #[serde(default)]
    pub has_warning: bool,
    #[serde(default)]
    pub reject_promise: bool,
}
