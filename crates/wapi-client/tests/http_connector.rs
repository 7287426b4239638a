//! HTTP connector tests against a local mock WAPI server

use serde_json::{Map, json};
use wapi_client::{
    Connector, MultiRequest, QueryArgs, StepDescriptor, WapiClient, WapiConfig, WapiError,
};
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NV_REF: &str = "networkview/ZG5zLm5ldHdvcmtfdmlldyQx:blue/false";

async fn client(server: &MockServer) -> WapiClient {
    let config = WapiConfig::new("unused", "admin", "infoblox");
    WapiClient::with_base_url(&format!("{}/wapi/v2.7", server.uri()), &config).unwrap()
}

fn return_extattrs() -> QueryArgs {
    QueryArgs::from([("_return_fields".to_string(), "extattrs".to_string())])
}

#[tokio::test]
async fn test_search_sends_filters_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wapi/v2.7/networkview"))
        .and(query_param("name", "blue"))
        .and(query_param("*Lock", "Available"))
        .and(query_param("_return_fields", "extattrs"))
        .and(basic_auth("admin", "infoblox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_ref": NV_REF, "extattrs": {"Lock": {"value": "Available"}}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let search = json!({"name": "blue", "*Lock": "Available"});
    let result = client(&server)
        .await
        .get_object("networkview", search.as_object().unwrap(), &return_extattrs())
        .await
        .unwrap();

    assert_eq!(result[0]["_ref"], json!(NV_REF));
}

#[tokio::test]
async fn test_update_puts_ea_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/wapi/v2.7/{NV_REF}")))
        .and(body_json(json!({"extattrs+": {"Lock": {"value": "tenant-a"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(NV_REF)))
        .expect(1)
        .mount(&server)
        .await;

    let body = json!({"extattrs+": {"Lock": {"value": "tenant-a"}}});
    let result = client(&server)
        .await
        .update_object(NV_REF, body.as_object().unwrap(), &QueryArgs::new())
        .await
        .unwrap();

    assert_eq!(result, json!(NV_REF));
}

#[tokio::test]
async fn test_create_posts_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wapi/v2.7/networkview"))
        .and(body_json(json!({"name": "blue", "extattrs": {"Lock": {"value": "Available"}}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!(NV_REF)))
        .expect(1)
        .mount(&server)
        .await;

    let body = json!({"name": "blue", "extattrs": {"Lock": {"value": "Available"}}});
    let result = client(&server)
        .await
        .create_object("networkview", body.as_object().unwrap(), &QueryArgs::new())
        .await
        .unwrap();

    assert_eq!(result, json!(NV_REF));
}

#[tokio::test]
async fn test_not_found_and_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/wapi/v2.7/{NV_REF}")))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/wapi/v2.7/{NV_REF}")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "Error": "AdmConDataError: None (IBDataConflictError)",
            "code": "Client.Ibap.Data.Conflict",
            "text": "network view is in use"
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = client
        .get_object(NV_REF, &Map::new(), &QueryArgs::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WapiError::NotFound(_)));

    let err = client.delete_object(NV_REF, &QueryArgs::new()).await.unwrap_err();
    match err {
        WapiError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "network view is in use");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_multi_request_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wapi/v2.7/networkview"))
        .and(query_param("name", "blue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"_ref": NV_REF}])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/wapi/v2.7/{NV_REF}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(NV_REF)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/wapi/v2.7/{NV_REF}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_ref": NV_REF,
            "extattrs": {"Owner": {"value": "tenant-a"}}
        })))
        .mount(&server)
        .await;

    let request = MultiRequest::new(vec![
        StepDescriptor::get("networkview")
            .field("name", "blue")
            .capture("NET_VIEW_REF", "_ref")
            .discarded(),
        StepDescriptor::update("##STATE:NET_VIEW_REF:##")
            .ea_add("Owner", "tenant-a")
            .with_substitution()
            .discarded(),
        StepDescriptor::get("##STATE:NET_VIEW_REF:##")
            .return_fields(&["extattrs"])
            .capture("OWNER", "*Owner")
            .with_substitution()
            .discarded(),
        StepDescriptor::display_state(),
    ]);

    let result = client(&server).await.execute_batch(&request).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.captured_str("OWNER"), Some("tenant-a"));
}
