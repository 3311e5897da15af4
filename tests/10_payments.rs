mod common;

use anyhow::Result;
use common::TestServer;
use fms_services::services::ServiceKind;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn payment(owner: &str, to_pay: f64) -> Value {
    json!({
        "bookingNumber": 4711,
        "toPay": to_pay,
        "passengerId": owner,
        "creditCard": {
            "cardNumber": 4111111111111111i64,
            "validityDate": "2999-12-31",
            "cvc": 123
        }
    })
}

#[tokio::test]
async fn create_returns_location_alert_and_event() -> Result<()> {
    let server = TestServer::spawn(ServiceKind::Payments).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/payments"))
        .bearer_auth(server.token("alice"))
        .json(&payment("alice", 99.5))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str()?.to_string();
    let alert = res.headers()[server.alert_header("alert").as_str()].to_str()?.to_string();
    assert!(res.headers().get(server.alert_header("validation").as_str()).is_none());

    let body: Value = res.json().await?;
    let id = body["id"].as_i64().expect("assigned id");
    assert_eq!(location, format!("/api/payments/{id}"));
    assert_eq!(alert, format!("A new paymentsPayment is created with identifier {id}"));

    let events = server.events.published_to("payment_set").await;
    assert_eq!(events.len(), 1);
    let event: Value = serde_json::from_str(&events[0].payload)?;
    assert_eq!(event, json!({ "id": id.to_string(), "bookingNumber": "4711", "toPay": "99.5" }));
    Ok(())
}

#[tokio::test]
async fn create_with_id_is_a_bad_request() -> Result<()> {
    let server = TestServer::spawn(ServiceKind::Payments).await?;
    let client = reqwest::Client::new();

    let mut body = payment("alice", 10.0);
    body["id"] = json!(12);
    let res = client.post(server.url("/api/payments")).json(&body).send().await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()[server.alert_header("error").as_str()], "error.idexists");
    assert_eq!(res.headers()[server.alert_header("params").as_str()], "paymentsPayment");
    let error: Value = res.json().await?;
    assert_eq!(error["errorKey"], "idexists");

    let list: Vec<Value> = client
        .get(server.url("/api/payments"))
        .bearer_auth(server.token("alice"))
        .send()
        .await?
        .json()
        .await?;
    assert!(list.is_empty());
    assert!(server.events.published().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn negative_amount_is_stored_and_flagged() -> Result<()> {
    let server = TestServer::spawn(ServiceKind::Payments).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/payments"))
        .json(&payment("alice", -5.0))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(
        res.headers()[server.alert_header("validation").as_str()],
        "toPay: Invalid amount to pay"
    );
    let id = res.json::<Value>().await?["id"].as_i64().expect("assigned id");

    let stored: Value = client
        .get(server.url(&format!("/api/payments/{id}")))
        .bearer_auth(server.token("alice"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stored["toPay"], -5.0);
    Ok(())
}

#[tokio::test]
async fn update_without_id_is_a_bad_request() -> Result<()> {
    let server = TestServer::spawn(ServiceKind::Payments).await?;
    let client = reqwest::Client::new();

    let res = client
        .put(server.url("/api/payments"))
        .json(&payment("alice", 10.0))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()[server.alert_header("error").as_str()], "error.idnull");
    assert!(server.events.published().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_publishes_payment_updated() -> Result<()> {
    let server = TestServer::spawn(ServiceKind::Payments).await?;
    let client = reqwest::Client::new();

    let mut created: Value = client
        .post(server.url("/api/payments"))
        .json(&payment("alice", 10.0))
        .send()
        .await?
        .json()
        .await?;
    created["toPay"] = json!(12.0);

    let res = client.put(server.url("/api/payments")).json(&created).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let id = created["id"].as_i64().expect("assigned id");
    assert_eq!(
        res.headers()[server.alert_header("alert").as_str()],
        format!("A paymentsPayment is updated with identifier {id}").as_str()
    );

    assert_eq!(server.events.published_to("payment_updated").await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn payments_are_private_to_their_owner() -> Result<()> {
    let server = TestServer::spawn(ServiceKind::Payments).await?;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(server.url("/api/payments"))
        .json(&payment("alice", 10.0))
        .send()
        .await?
        .json()
        .await?;
    let path = format!("/api/payments/{}", created["id"]);

    let res = client.get(server.url(&path)).bearer_auth(server.token("bob")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(server.url(&path)).bearer_auth(server.token("bob")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let anonymous: Vec<Value> = client.get(server.url("/api/payments")).send().await?.json().await?;
    assert!(anonymous.is_empty());

    let res = client.delete(server.url(&path)).bearer_auth(server.token("alice")).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    Ok(())
}
