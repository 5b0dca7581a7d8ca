//! Stateless HTTP request builder and response parser for any resource.
//!
//! # Design
//! `ResourceClient<R>` holds only a `base_url`. Each CRUD operation is split
//! into a `build_*` method that produces an `HttpRequest` and a `parse_*`
//! method that consumes an `HttpResponse`; `ResourceApi` runs the round-trip
//! in between. Payloads are validated in `build_*`, so a rejected payload
//! never becomes a request. Paths follow the backend convention:
//! `{segment}/list`, `{segment}/all`, `{segment}/{id}`, `{segment}/create`,
//! and POST for `update/{id}` and `delete/{id}`.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};
use crate::params::with_query;
use crate::resource::Resource;
use crate::types::{Envelope, ListParams, Paginated};
use crate::validation::ensure_valid;

/// Join `path` onto `base`, leaving absolute URLs untouched.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub(crate) fn json_request<T: Serialize + ?Sized>(
    method: HttpMethod,
    url: String,
    body: &T,
) -> Result<HttpRequest, ApiError> {
    let body = Body::json(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(HttpRequest::new(method, url).with_body(body))
}

/// Any 2xx passes; everything else becomes `NotFound` or `Http`.
pub(crate) fn ensure_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_response(response))
}

/// Decode a JSON body; an empty body reads as `null`.
pub(crate) fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

pub struct ResourceClient<R> {
    base_url: String,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("resource", &R::NAME)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            _resource: PhantomData,
        }
    }

    /// `{base_url}/{segment}/{suffix}`.
    pub fn url(&self, suffix: &str) -> String {
        endpoint(&self.base_url, &format!("{}/{}", R::NAME, suffix))
    }

    pub fn build_list(&self, params: &ListParams<R::Filter>) -> Result<HttpRequest, ApiError> {
        params.validate()?;
        let url = with_query(&self.url("list"), params)?;
        Ok(HttpRequest::new(HttpMethod::Get, url))
    }

    pub fn build_get_all(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.url("all"))
    }

    pub fn build_get_by_id(&self, id: &R::Id) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.url(&id.to_string()))
    }

    pub fn build_create(&self, input: &R::Create) -> Result<HttpRequest, ApiError> {
        ensure_valid(input)?;
        json_request(HttpMethod::Post, self.url("create"), input)
    }

    pub fn build_update(&self, id: &R::Id, input: &R::Update) -> Result<HttpRequest, ApiError> {
        ensure_valid(input)?;
        json_request(HttpMethod::Post, self.url(&format!("update/{id}")), input)
    }

    pub fn build_delete(&self, id: &R::Id) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, self.url(&format!("delete/{id}")))
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Paginated<R::Entity>, ApiError> {
        ensure_success(&response)?;
        decode(&response)
    }

    pub fn parse_get_all(&self, response: HttpResponse) -> Result<Vec<R::Entity>, ApiError> {
        ensure_success(&response)?;
        let envelope: Envelope<Vec<R::Entity>> = decode(&response)?;
        Ok(envelope.data)
    }

    pub fn parse_get_by_id(&self, response: HttpResponse) -> Result<R::Entity, ApiError> {
        ensure_success(&response)?;
        let envelope: Envelope<R::Entity> = decode(&response)?;
        Ok(envelope.data)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Envelope<R::Entity>, ApiError> {
        ensure_success(&response)?;
        decode(&response)
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<Envelope<R::Entity>, ApiError> {
        ensure_success(&response)?;
        decode(&response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        ensure_success(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::area::{Area, AreaFilter, CreateArea, UpdateArea};
    use crate::resources::user::User;
    use crate::types::PageRequest;

    fn client() -> ResourceClient<Area> {
        ResourceClient::new("http://localhost:5000/api")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn endpoint_normalises_slashes() {
        assert_eq!(endpoint("http://h/api/", "/areas/all"), "http://h/api/areas/all");
        assert_eq!(endpoint("http://h/api", "areas/all"), "http://h/api/areas/all");
        assert_eq!(endpoint("http://h/api", "https://other/x"), "https://other/x");
    }

    #[test]
    fn build_list_produces_paged_query() {
        let params = ListParams::with_filter(
            PageRequest::new(1, 10),
            AreaFilter {
                keyword: Some(String::new()),
            },
        );
        let req = client().build_list(&params).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:5000/api/areas/list?pageNumber=1&pageSize=10");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_list_rejects_page_zero() {
        let params: ListParams<AreaFilter> = ListParams::page(0, 10);
        assert!(matches!(client().build_list(&params), Err(ApiError::Validation(_))));
    }

    #[test]
    fn build_get_by_id_uses_segment() {
        let req = client().build_get_by_id(&42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:5000/api/areas/42");
    }

    #[test]
    fn user_ids_render_as_uuid() {
        let users: ResourceClient<User> = ResourceClient::new("http://localhost:5000/api");
        let req = users.build_delete(&uuid::Uuid::nil());
        assert_eq!(
            req.url,
            "http://localhost:5000/api/users/delete/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn build_create_posts_json() {
        let input = CreateArea {
            name: "North campus".to_string(),
            code: Some("NORTH".to_string()),
            description: None,
        };
        let req = client().build_create(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:5000/api/areas/create");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "North campus");
        assert!(body.get("description").is_none());
    }

    #[test]
    fn build_create_rejects_short_name_before_any_request() {
        let input = CreateArea {
            name: String::new(),
            code: None,
            description: None,
        };
        let err = client().build_create(&input).unwrap_err();
        match err {
            ApiError::Validation(errors) => assert!(errors.field_errors().contains_key("name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn build_update_posts_to_update_path() {
        let input = UpdateArea {
            name: Some("South campus".to_string()),
            ..Default::default()
        };
        let req = client().build_update(&7, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:5000/api/areas/update/7");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "South campus"}));
    }

    #[test]
    fn build_delete_posts_without_body() {
        let req = client().build_delete(&7);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:5000/api/areas/delete/7");
        assert!(req.body.is_none());
    }

    #[test]
    fn parse_list_empty_resource() {
        let page = client()
            .parse_list(response(200, r#"{"data":[],"totalCount":0,"pageNumber":1,"pageSize":10}"#))
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn parse_get_by_id_unwraps_envelope() {
        let area = client()
            .parse_get_by_id(response(200, r#"{"data":{"id":3,"name":"East"},"message":""}"#))
            .unwrap();
        assert_eq!(area.id, 3);
        assert_eq!(area.name, "East");
    }

    #[test]
    fn parse_get_by_id_not_found() {
        let err = client().parse_get_by_id(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn parse_create_accepts_any_2xx() {
        let created = client()
            .parse_create(response(201, r#"{"data":{"id":1,"name":"West"},"message":"Created"}"#))
            .unwrap();
        assert_eq!(created.data.id, 1);
        assert_eq!(created.message, "Created");
    }

    #[test]
    fn parse_delete_accepts_empty_204() {
        assert!(client().parse_delete(response(204, "")).is_ok());
    }

    #[test]
    fn parse_update_server_error() {
        let err = client()
            .parse_update(response(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn parse_list_bad_json() {
        let err = client().parse_list(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
