use edistribucion_rs::api::Error;
use edistribucion_rs::model::Api;
use edistribucion_rs::LoginStep;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = include_str!("../resources/test/loginPage.html");
const LANDING_PAGE: &str = include_str!("../resources/test/landingPage.html");
const GET_LOGIN_INFO: &str = include_str!("../resources/test/getLoginInfo.json");
const GET_CUPS: &str = include_str!("../resources/test/getCups.json");
const CONSULTAR_CONTADOR: &str = include_str!("../resources/test/consultarContador.json");
const CONSULTAR_CONTADOR_WARNING: &str =
    include_str!("../resources/test/consultarContador_warning.json");

const AURA: &str = "/areaprivada/s/sfsites/aura";
/* Bearer token of landingPage.html, form encoded */
const TOKEN_FIELD: &str = "aura.token=eyJub25jZSI6IjEyMyJ9.e30%3D.c2ln";

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=UTF-8")
}

fn json(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/json;charset=UTF-8")
}

fn api(server: &MockServer) -> Api {
    edistribucion_rs::api(
        server.uri(),
        "user@example.com".to_string(),
        "secret".to_string(),
    )
}

fn login_page() -> Mock {
    Mock::given(method("GET"))
        .and(path("/areaprivada/s/login"))
        .respond_with(html(LOGIN_PAGE))
}

fn credential_submit(response: ResponseTemplate) -> Mock {
    Mock::given(method("POST"))
        .and(path(AURA))
        .and(query_param("other.LightningLoginForm.login", "1"))
        .and(body_string_contains("aura.token=undefined"))
        .and(body_string_contains("LightningLoginFormController"))
        .respond_with(response)
}

fn login_events() -> ResponseTemplate {
    json(r#"{"events":[{"descriptor":"markup://aura:clientRedirect","attributes":{"values":{"url":"/areaprivada/secur/frontdoor.jsp?sid=1"}}}]}"#)
}

fn redirect_follow() -> Mock {
    Mock::given(method("GET"))
        .and(path("/areaprivada/secur/frontdoor.jsp"))
        .respond_with(html("<html></html>").insert_header("set-cookie", "sid=abc; Path=/"))
}

fn landing_page(body: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path("/areaprivada/s/"))
        .and(header("cookie", "sid=abc"))
        .respond_with(html(body))
}

fn action(command: &str, response: ResponseTemplate) -> Mock {
    Mock::given(method("POST"))
        .and(path(AURA))
        .and(query_param(command, ""))
        .and(header("accept", "application/json"))
        .and(body_string_contains(TOKEN_FIELD))
        .respond_with(response)
}

fn get_login_info() -> Mock {
    action("WP_Monitor_CTRL.getLoginInfo", json(GET_LOGIN_INFO))
}

async fn mount_login(server: &MockServer) {
    login_page().expect(1).mount(server).await;
    credential_submit(login_events()).expect(1).mount(server).await;
    redirect_follow().expect(1).mount(server).await;
    landing_page(LANDING_PAGE).expect(1).mount(server).await;
    get_login_info().expect(1).mount(server).await;
}

fn assert_login_failed(result: Result<edistribucion_rs::model::Session, Error>, expected: LoginStep) {
    match result {
        Err(Error::LoginFailed { step, .. }) => assert_eq!(expected, step),
        Err(e) => panic!("unexpected error: {:?}", e),
        Ok(_) => panic!("login unexpectedly succeeded"),
    }
}

#[tokio::test]
async fn login_succeeds() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();

    assert_eq!("7xz9nIYv0cFFpbNTsZHbRg", session.descriptor().fwuid());
    assert_eq!("eyJub25jZSI6IjEyMyJ9.e30=.c2ln", session.token().as_str());
    assert_eq!("0011n00001XyZwQAAV", session.account_id().as_str());
    assert_eq!("JUAN", session.login_info().first_name);
}

#[tokio::test]
async fn login_stops_on_empty_events() {
    let server = MockServer::start().await;
    login_page().expect(1).mount(&server).await;
    credential_submit(json(r#"{"events":[]}"#))
        .expect(1)
        .mount(&server)
        .await;
    redirect_follow().expect(0).mount(&server).await;
    landing_page(LANDING_PAGE).expect(0).mount(&server).await;
    get_login_info().expect(0).mount(&server).await;

    let result = edistribucion_rs::login(&api(&server)).await;
    assert_login_failed(result, LoginStep::CredentialSubmit);
}

#[tokio::test]
async fn login_fails_without_descriptor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/areaprivada/s/login"))
        .respond_with(html("<html><head><title>Mantenimiento</title></head></html>"))
        .expect(1)
        .mount(&server)
        .await;
    credential_submit(login_events())
        .expect(0)
        .mount(&server)
        .await;

    match edistribucion_rs::login(&api(&server)).await {
        Err(Error::LoginFailed { step, source }) => {
            assert_eq!(LoginStep::Bootstrap, step);
            assert!(matches!(*source, Error::Extraction(_)));
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn login_fails_without_token() {
    let server = MockServer::start().await;
    login_page().expect(1).mount(&server).await;
    credential_submit(login_events())
        .expect(1)
        .mount(&server)
        .await;
    redirect_follow().expect(1).mount(&server).await;
    landing_page("<html><script>var other = {};</script></html>")
        .expect(1)
        .mount(&server)
        .await;
    get_login_info().expect(0).mount(&server).await;

    let result = edistribucion_rs::login(&api(&server)).await;
    assert_login_failed(result, LoginStep::TokenCapture);
}

#[tokio::test]
async fn login_fails_without_account() {
    let server = MockServer::start().await;
    login_page().mount(&server).await;
    credential_submit(login_events()).mount(&server).await;
    redirect_follow().mount(&server).await;
    landing_page(LANDING_PAGE).mount(&server).await;
    action(
        "WP_Monitor_CTRL.getLoginInfo",
        json(r#"{"actions":[{"id":"215;a","state":"SUCCESS","returnValue":{"Id":"005","visibility":{}}}]}"#),
    )
    .mount(&server)
    .await;

    let result = edistribucion_rs::login(&api(&server)).await;
    assert_login_failed(result, LoginStep::AccountResolve);
}

#[tokio::test]
async fn list_cups_preserves_order() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(AURA))
        .and(query_param("WP_ContadorICP_F2_CTRL.getCUPSReconectarICP", ""))
        .and(body_string_contains("0011n00001XyZwQAAV"))
        .respond_with(json(GET_CUPS))
        .expect(1)
        .mount(&server)
        .await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    let cups = edistribucion_rs::list_cups(&session).await.unwrap();

    let ids: Vec<&str> = cups.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(vec!["a0X1n00000Aaaa1EAB", "a0X1n00000Bbbb2EAB"], ids);
    assert_eq!("AV DIAGONAL 2, 08001 BARCELONA", cups[1].provisioning_address);
}

#[tokio::test]
async fn list_cups_without_envelope_is_session_expired() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    action(
        "WP_ContadorICP_F2_CTRL.getCUPSReconectarICP",
        html("<html><body>Sesión caducada</body></html>"),
    )
    .mount(&server)
    .await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    assert!(matches!(
        edistribucion_rs::list_cups(&session).await,
        Err(Error::SessionExpired(_))
    ));
}

#[tokio::test]
async fn meter_info_warning() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    action(
        "WP_ContadorICP_F2_CTRL.consultarContador",
        json(CONSULTAR_CONTADOR_WARNING),
    )
    .mount(&server)
    .await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    match edistribucion_rs::meter_info(&session, "a0X1n00000Aaaa1EAB").await {
        Err(Error::RemoteWarning(message)) => assert_eq!("ICP desconectado", message),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn meter_info_is_repeatable() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(AURA))
        .and(query_param("WP_ContadorICP_F2_CTRL.consultarContador", ""))
        .and(body_string_contains("a0X1n00000Aaaa1EAB"))
        .respond_with(json(CONSULTAR_CONTADOR))
        .expect(2)
        .mount(&server)
        .await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    let first = edistribucion_rs::meter_info(&session, "a0X1n00000Aaaa1EAB")
        .await
        .unwrap();
    let second = edistribucion_rs::meter_info(&session, "a0X1n00000Aaaa1EAB")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(0.35, first.current_power);
    assert_eq!(Some(7.61), first.percentage_value());
}

#[tokio::test]
async fn login_follows_absolute_redirect() {
    let server = MockServer::start().await;
    login_page().expect(1).mount(&server).await;
    let events = format!(
        r#"{{"events":[{{"descriptor":"markup://aura:clientRedirect","attributes":{{"values":{{"url":"{}/areaprivada/secur/frontdoor.jsp?sid=1"}}}}}}]}}"#,
        server.uri()
    );
    credential_submit(json(&events)).expect(1).mount(&server).await;
    redirect_follow().expect(1).mount(&server).await;
    landing_page(LANDING_PAGE).expect(1).mount(&server).await;
    get_login_info().expect(1).mount(&server).await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    assert_eq!("0011n00001XyZwQAAV", session.account_id().as_str());
}

#[tokio::test]
async fn list_cups_error_state_is_session_expired() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    action(
        "WP_ContadorICP_F2_CTRL.getCUPSReconectarICP",
        json(r#"{"actions":[{"id":"270;a","state":"ERROR","returnValue":null,"error":[{"message":"Sesión no válida"}]}]}"#),
    )
    .mount(&server)
    .await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    match edistribucion_rs::list_cups(&session).await {
        Err(Error::SessionExpired(message)) => assert_eq!("Sesión no válida", message),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn list_cups_warning_stays_remote_warning() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    action(
        "WP_ContadorICP_F2_CTRL.getCUPSReconectarICP",
        json(r#"{"actions":[{"id":"270;a","state":"SUCCESS","returnValue":{"data":null,"hasWarning":true,"warning":{"message":"Sin suministros"}}}]}"#),
    )
    .mount(&server)
    .await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    match edistribucion_rs::list_cups(&session).await {
        Err(Error::RemoteWarning(message)) => assert_eq!("Sin suministros", message),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn meter_info_invalid_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    action(
        "WP_ContadorICP_F2_CTRL.consultarContador",
        json(r#"{"event":{"descriptor":"markup://aura:invalidSession","attributes":{"values":{}}},"exceptionEvent":true}"#),
    )
    .mount(&server)
    .await;

    let session = edistribucion_rs::login(&api(&server)).await.unwrap();
    assert!(matches!(
        edistribucion_rs::meter_info(&session, "a0X1n00000Aaaa1EAB").await,
        Err(Error::SessionExpired(_))
    ));
}
