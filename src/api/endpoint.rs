pub type Endpoint = str;

pub const LOGIN_PAGE: &Endpoint = "/areaprivada/s/login?ec=302&startURL=%2Fareaprivada%2Fs%2F";
pub const LOGIN_ACTION: &Endpoint = "/areaprivada/s/sfsites/aura?other.LightningLoginForm.login=1";
pub const LANDING_PAGE: &Endpoint = "/areaprivada/s/";
/* Command name of the action is appended as query string */
pub const AURA: &Endpoint = "/areaprivada/s/sfsites/aura?";

/* Values of `aura.pageURI` */
pub const LOGIN_PAGE_URI: &str = "/areaprivada/s/login/?language=es&startURL=%2Fareaprivada%2Fs%2F&ec=302";
pub const DASHBOARD_PAGE_URI: &str = "/areaprivada/s/wp-online-access";

/* `startUrl` param of the login action */
pub const START_URL: &str = "/areaprivada/s/";
