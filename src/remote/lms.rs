//! Canvas LMS access.
//!
//! [`LmsApi`] is the read-only capability the mirror and the task pass depend on.
//! [`HttpLmsClient`] implements it with blocking reqwest calls, one request per method call.

use crate::error::ApiError;
use crate::remote::records::{
    parse_list, Assignment, Course, FileDescriptor, Folder, Module, ModuleItem,
};
use crate::types::CourseId;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

/// Read access to a Canvas instance.
///
/// Listings of files and module items yield one result per record so that a single
/// malformed record fails only itself.
pub trait LmsApi {
    fn list_courses(&self) -> Result<Vec<Course>, ApiError>;
    fn list_folders(&self, course_id: CourseId) -> Result<Vec<Folder>, ApiError>;
    fn list_folder_files(
        &self,
        folder: &Folder,
    ) -> Result<Vec<Result<FileDescriptor, ApiError>>, ApiError>;
    fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, ApiError>;
    fn list_module_items(
        &self,
        module: &Module,
    ) -> Result<Vec<Result<ModuleItem, ApiError>>, ApiError>;
    fn fetch_detail(&self, url: &str) -> Result<Value, ApiError>;
    fn list_assignments(&self, course_id: CourseId) -> Result<Vec<Assignment>, ApiError>;
    /// Stream the bytes behind `url` into `sink`, returning the number of bytes written.
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ApiError>;
}

/// Parse each element of a JSON array independently.
fn parse_each<T>(value: &Value, record: &'static str) -> Result<Vec<Result<T, ApiError>>, ApiError>
where
    T: for<'a> TryFrom<&'a Value, Error = ApiError>,
{
    let items = value.as_array().ok_or_else(|| {
        ApiError::Serialization(format!("expected a JSON array of {} records", record))
    })?;
    Ok(items.iter().map(|item| T::try_from(item)).collect())
}

/// Blocking HTTP client for the Canvas REST API.
pub struct HttpLmsClient {
    client: Client,
    api_heading: String,
    auth: HeaderValue,
    per_page: u32,
}

impl HttpLmsClient {
    pub fn new(api_heading: &str, api_key: &str, per_page: u32) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| ApiError::ConfigError(format!("Invalid Canvas API key: {}", e)))?;
        auth.set_sensitive(true);

        let client = Client::builder()
            .user_agent(concat!("canvas-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_heading: api_heading.trim_end_matches('/').to_string(),
            auth,
            per_page,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.api_heading, path)
    }

    /// Attach the bearer token only for requests to the Canvas host itself.
    fn with_auth(&self, request: RequestBuilder, url: &str) -> RequestBuilder {
        let same_host = match (Url::parse(url), Url::parse(&self.api_heading)) {
            (Ok(target), Ok(base)) => target.host_str() == base.host_str(),
            _ => false,
        };
        if same_host {
            request.header(AUTHORIZATION, self.auth.clone())
        } else {
            request
        }
    }

    fn get(&self, url: &str, paged: bool) -> Result<Response, ApiError> {
        let mut request = self.client.get(url);
        if paged {
            request = request.query(&[
                ("per_page", self.per_page.to_string()),
                ("include[]", "submission".to_string()),
            ]);
        }
        debug!(url, "GET");
        let response = self.with_auth(request, url).send()?;
        check_status(response, url)
    }

    fn get_json(&self, url: &str, paged: bool) -> Result<Value, ApiError> {
        Ok(self.get(url, paged)?.json()?)
    }
}

fn check_status(response: Response, url: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(format!(
            "Canvas rejected the API key for {}",
            url
        )));
    }
    if !status.is_success() {
        return Err(ApiError::RemoteStatus {
            status: status.as_u16(),
            context: url.to_string(),
        });
    }
    Ok(response)
}

impl LmsApi for HttpLmsClient {
    fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        let value = self.get_json(&self.api_url("courses"), true)?;
        let courses = value.as_array().ok_or_else(|| {
            ApiError::Serialization("expected a JSON array of course records".to_string())
        })?;
        // Concluded or restricted courses come back without a name; they are not selectable.
        Ok(courses
            .iter()
            .filter_map(|course| Course::try_from(course).ok())
            .collect())
    }

    fn list_folders(&self, course_id: CourseId) -> Result<Vec<Folder>, ApiError> {
        let value = self.get_json(&self.api_url(&format!("courses/{}/folders", course_id)), true)?;
        parse_list(&value, "folder")
    }

    fn list_folder_files(
        &self,
        folder: &Folder,
    ) -> Result<Vec<Result<FileDescriptor, ApiError>>, ApiError> {
        let value = self.get_json(&folder.files_url, true)?;
        parse_each(&value, "file")
    }

    fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, ApiError> {
        let value = self.get_json(&self.api_url(&format!("courses/{}/modules", course_id)), true)?;
        parse_list(&value, "module")
    }

    fn list_module_items(
        &self,
        module: &Module,
    ) -> Result<Vec<Result<ModuleItem, ApiError>>, ApiError> {
        let value = self.get_json(&module.items_url, true)?;
        parse_each(&value, "module item")
    }

    fn fetch_detail(&self, url: &str) -> Result<Value, ApiError> {
        self.get_json(url, false)
    }

    fn list_assignments(&self, course_id: CourseId) -> Result<Vec<Assignment>, ApiError> {
        let value = self.get_json(
            &self.api_url(&format!("courses/{}/assignments", course_id)),
            true,
        )?;
        parse_list(&value, "assignment")
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ApiError> {
        let mut response = self.get(url, false)?;
        Ok(response.copy_to(sink)?)
    }
}
