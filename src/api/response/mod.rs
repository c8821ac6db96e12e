pub mod consultar_contador;
pub mod get_cups;
pub mod get_login_info;
pub mod login;

use crate::model;

impl From<get_login_info::GetLoginInfo> for model::LoginInfo {
    fn from(info: get_login_info::GetLoginInfo) -> Self {
        model::LoginInfo {
            user_id: info.id,
            name: info.name,
            first_name: info.first_name,
            account_id: model::AccountId(info.visibility.id),
        }
    }
}

impl From<get_cups::Cups> for model::Cups {
    fn from(cups: get_cups::Cups) -> Self {
        model::Cups {
            id: cups.id,
            name: cups.name,
            provisioning_address: cups.provisioning_address,
            action_link: cups.button_link,
        }
    }
}

impl From<consultar_contador::Data> for model::MeterInfo {
    fn from(data: consultar_contador::Data) -> Self {
        model::MeterInfo {
            current_power: data.potencia_actual,
            contracted_power: data.potencia_contratada,
            percentage: data.percentage,
            icp_state: data.estado_icp,
            totalizer: data.totalizador,
        }
    }
}
