//! # Jenkins Job Store
//!
//! [`JenkinsJobStore`] implements [`JobStore`] over the Jenkins remote
//! access API with a blocking `reqwest` client:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list jobs | `GET api/json?tree=jobs[name]` |
//! | get job | `GET job/{name}/api/json?tree=name` |
//! | create job | `POST createItem?name={name}` with the job XML |
//! | update job | `POST job/{name}/config.xml` with the job XML |
//! | list views | `GET api/json?tree=views[name]` |
//! | create view | `POST createView?name={name}` with a ListView XML |
//! | view members | `GET view/{name}/api/json?tree=jobs[name]` |
//! | add to view | `POST view/{name}/addJobToView?name={job}` |
//!
//! Requests authenticate with the user name and API token. When the server
//! has CSRF protection enabled, a crumb is fetched once from
//! `crumbIssuer/api/json` and sent with every POST. Calls are not retried;
//! a non-success status becomes an [`Error::JobStore`].

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use crate::defaults::HTTP_TIMEOUT_SECS;
use crate::error::{Error, Result};
use crate::jobstore::{JobHandle, JobStore, ViewHandle};
use crate::settings::JenkinsSettings;
use crate::template::escape_xml;

const XML: &str = "application/xml";

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<Named>,
}

#[derive(Debug, Default, Deserialize)]
struct ViewList {
    #[serde(default)]
    views: Vec<Named>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Crumb {
    crumb: String,
    crumb_request_field: String,
}

/// A Jenkins server reached over HTTP.
pub struct JenkinsJobStore {
    base: Url,
    user: String,
    api_token: String,
    client: Client,
    /// `None` until the first POST; `Some(None)` when CSRF is disabled.
    crumb: Mutex<Option<Option<Crumb>>>,
}

impl std::fmt::Debug for JenkinsJobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JenkinsJobStore")
            .field("base", &self.base.as_str())
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl JenkinsJobStore {
    pub fn new(settings: &JenkinsSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| store_error("connect", settings.url.as_str(), e.to_string()))?;

        // A base without a trailing slash would drop its last segment when
        // joined.
        let mut base = settings.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            user: settings.user.clone(),
            api_token: settings.api_token.clone(),
            client,
            crumb: Mutex::new(None),
        })
    }

    /// The server root this store talks to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `base` followed by `segments`, each percent-encoded, then `query`.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| store_error("build url", self.base.as_str(), "base URL cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.user, Some(&self.api_token))
    }

    fn post(&self, operation: &str, target: &str, url: Url) -> Result<RequestBuilder> {
        let mut request = self
            .client
            .post(url)
            .basic_auth(&self.user, Some(&self.api_token));
        if let Some(crumb) = self.crumb(operation, target)? {
            request = request.header(crumb.crumb_request_field.as_str(), crumb.crumb.as_str());
        }
        Ok(request)
    }

    fn crumb(&self, operation: &str, target: &str) -> Result<Option<Crumb>> {
        let mut cached = self.crumb.lock().map_err(|_| Error::LockPoisoned {
            context: "jenkins crumb".to_string(),
        })?;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        let url = self.endpoint(&["crumbIssuer", "api", "json"], &[])?;
        let response = self
            .get(url)
            .send()
            .map_err(|e| store_error(operation, target, e.to_string()))?;
        let crumb = if response.status() == StatusCode::NOT_FOUND {
            debug!("CSRF protection is disabled on {}", self.base);
            None
        } else {
            let response = check(response, operation, target)?;
            Some(parse_json::<Crumb>(response, operation, target)?)
        };
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    fn fetch_json<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        target: &str,
        url: Url,
    ) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .get(url)
            .send()
            .map_err(|e| store_error(operation, target, e.to_string()))?;
        let response = check(response, operation, target)?;
        parse_json(response, operation, target)
    }

    fn post_xml(&self, operation: &str, target: &str, url: Url, body: String) -> Result<()> {
        debug!("POST {}", url);
        let response = self
            .post(operation, target, url)?
            .header(CONTENT_TYPE, XML)
            .body(body)
            .send()
            .map_err(|e| store_error(operation, target, e.to_string()))?;
        check(response, operation, target)?;
        Ok(())
    }
}

fn store_error(operation: &str, target: &str, message: impl Into<String>) -> Error {
    Error::JobStore {
        operation: operation.to_string(),
        target: target.to_string(),
        message: message.into(),
    }
}

fn check(response: Response, operation: &str, target: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(store_error(operation, target, format!("HTTP {}", status)))
    }
}

fn parse_json<T: for<'de> Deserialize<'de>>(
    response: Response,
    operation: &str,
    target: &str,
) -> Result<T> {
    response
        .json::<T>()
        .map_err(|e| store_error(operation, target, format!("unreadable response: {}", e)))
}

/// The body Jenkins expects when creating an empty list view.
fn list_view_xml(name: &str) -> String {
    format!(
        "<?xml version='1.1' encoding='UTF-8'?>\n\
         <hudson.model.ListView>\n  \
         <name>{}</name>\n  \
         <filterExecutors>false</filterExecutors>\n  \
         <filterQueue>false</filterQueue>\n  \
         <properties class=\"hudson.model.View$PropertyList\"/>\n  \
         <jobNames>\n    <comparator class=\"hudson.util.CaseInsensitiveComparator\"/>\n  </jobNames>\n  \
         <jobFilters/>\n  \
         <columns/>\n  \
         <recurse>false</recurse>\n\
         </hudson.model.ListView>\n",
        escape_xml(name)
    )
}

impl JobStore for JenkinsJobStore {
    fn list_job_identities(&self) -> Result<BTreeSet<String>> {
        let url = self.endpoint(&["api", "json"], &[("tree", "jobs[name]")])?;
        let list: JobList = self.fetch_json("list jobs", self.base.as_str(), url)?;
        Ok(list.jobs.into_iter().map(|job| job.name).collect())
    }

    fn get_job(&self, identity: &str) -> Result<JobHandle> {
        let url = self.endpoint(&["job", identity, "api", "json"], &[("tree", "name")])?;
        let job: Named = self.fetch_json("get job", identity, url)?;
        Ok(JobHandle { name: job.name })
    }

    fn create_job(&self, identity: &str, content: &str) -> Result<JobHandle> {
        let url = self.endpoint(&["createItem"], &[("name", identity)])?;
        self.post_xml("create job", identity, url, content.to_string())?;
        Ok(JobHandle {
            name: identity.to_string(),
        })
    }

    fn update_job(&self, job: &JobHandle, content: &str) -> Result<()> {
        let url = self.endpoint(&["job", &job.name, "config.xml"], &[])?;
        self.post_xml("update job", &job.name, url, content.to_string())
    }

    fn list_views(&self) -> Result<BTreeSet<String>> {
        let url = self.endpoint(&["api", "json"], &[("tree", "views[name]")])?;
        let list: ViewList = self.fetch_json("list views", self.base.as_str(), url)?;
        Ok(list.views.into_iter().map(|view| view.name).collect())
    }

    fn create_view(&self, name: &str) -> Result<ViewHandle> {
        let url = self.endpoint(&["createView"], &[("name", name)])?;
        self.post_xml("create view", name, url, list_view_xml(name))?;
        Ok(ViewHandle {
            name: name.to_string(),
        })
    }

    fn view_contains(&self, view: &ViewHandle, identity: &str) -> Result<bool> {
        let url = self.endpoint(&["view", &view.name, "api", "json"], &[("tree", "jobs[name]")])?;
        let list: JobList = self.fetch_json("read view", &view.name, url)?;
        Ok(list.jobs.iter().any(|job| job.name == identity))
    }

    fn add_job_to_view(&self, view: &ViewHandle, identity: &str) -> Result<()> {
        let url = self.endpoint(&["view", &view.name, "addJobToView"], &[("name", identity)])?;
        debug!("POST {}", url);
        let response = self
            .post("add to view", identity, url)?
            .send()
            .map_err(|e| store_error("add to view", identity, e.to_string()))?;
        check(response, "add to view", identity)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(url: &str) -> JenkinsJobStore {
        JenkinsJobStore::new(&JenkinsSettings {
            url: Url::parse(url).unwrap(),
            user: "ci-bot".to_string(),
            api_token: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        assert_eq!(
            store("https://ci.example.org/jenkins").base_url().as_str(),
            "https://ci.example.org/jenkins/"
        );
        assert_eq!(
            store("https://ci.example.org/").base_url().as_str(),
            "https://ci.example.org/"
        );
    }

    #[test]
    fn test_endpoint_encodes_view_names() {
        let store = store("https://ci.example.org/jenkins");
        let url = store
            .endpoint(&["view", "focal unstable", "addJobToView"], &[("name", "focal_unstable_foo")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ci.example.org/jenkins/view/focal%20unstable/addJobToView?name=focal_unstable_foo"
        );
    }

    #[test]
    fn test_endpoint_encodes_slashes_in_segments() {
        let store = store("https://ci.example.org/");
        let url = store.endpoint(&["job", "a/b", "config.xml"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://ci.example.org/job/a%2Fb/config.xml");
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let store = store("https://ci.example.org/");
        let url = store.endpoint(&["api", "json"], &[("tree", "jobs[name]")]).unwrap();
        assert_eq!(url.path(), "/api/json");
        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs[0].1, "jobs[name]");
    }

    #[test]
    fn test_list_view_xml_escapes_name() {
        let xml = list_view_xml("a<b");
        assert!(xml.contains("<name>a&lt;b</name>"));
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<hudson.model.ListView>"));
    }

    #[test]
    fn test_debug_hides_token() {
        let text = format!("{:?}", store("https://ci.example.org/"));
        assert!(text.contains("ci-bot"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_job_list_parses_jenkins_json() {
        let list: JobList = serde_json::from_str(
            r#"{"_class":"hudson.model.Hudson","jobs":[{"_class":"hudson.model.FreeStyleProject","name":"merger"}]}"#,
        )
        .unwrap();
        assert_eq!(list.jobs.len(), 1);
        assert_eq!(list.jobs[0].name, "merger");

        let empty: ViewList = serde_json::from_str(r#"{"_class":"hudson.model.Hudson"}"#).unwrap();
        assert!(empty.views.is_empty());
    }

    #[test]
    fn test_crumb_parses_camel_case() {
        let crumb: Crumb =
            serde_json::from_str(r#"{"crumb":"abc","crumbRequestField":"Jenkins-Crumb"}"#).unwrap();
        assert_eq!(crumb.crumb_request_field, "Jenkins-Crumb");
    }
}
