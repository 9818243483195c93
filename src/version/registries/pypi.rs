//! PyPI registry client for the JSON API and the legacy XML-RPC API

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::{DEFAULT_INDEX_URL, USER_AGENT};
use crate::version::error::{QypiError, RegistryError};
use crate::version::registries::xmlrpc::{self, XmlRpcValue};
use crate::version::registry::Registry;
use crate::version::types::{MetadataDocument, SearchQuery};

/// PyPI registry client
///
/// The HTTP client is built on first use and shared by every later request.
pub struct PypiRegistry {
    session: OnceCell<Client>,
    index_url: String,
}

impl Default for PypiRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_URL)
    }
}

impl PypiRegistry {
    pub fn new(index_url: &str) -> Self {
        Self {
            session: OnceCell::new(),
            index_url: index_url.trim_end_matches('/').to_string(),
        }
    }

    async fn session(&self) -> Result<&Client, RegistryError> {
        let client = self
            .session
            .get_or_try_init(|| async {
                debug!("Creating HTTP session for {}", self.index_url);
                Client::builder().user_agent(USER_AGENT).build()
            })
            .await?;
        Ok(client)
    }

    fn url(&self, path: &[&str]) -> String {
        format!("{}/{}", self.index_url, path.join("/"))
    }

    async fn get(&self, path: &[&str]) -> Result<Response, RegistryError> {
        let url = self.url(path);
        debug!("Fetching PyPI metadata: {}", url);
        Ok(self.session().await?.get(&url).send().await?)
    }

    async fn into_document(response: Response) -> Result<MetadataDocument, RegistryError> {
        let status = response.status();
        if !status.is_success() {
            warn!("PyPI returned status {}: {}", status, response.url());
            return Err(RegistryError::Status {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse PyPI response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }

    async fn xmlrpc(
        &self,
        method: &str,
        params: &[XmlRpcValue],
    ) -> Result<XmlRpcValue, RegistryError> {
        debug!("Calling XML-RPC method {} on {}", method, self.index_url);

        let response = self
            .session()
            .await?
            .post(&self.index_url)
            .header(CONTENT_TYPE, "text/xml")
            .body(xmlrpc::encode_call(method, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("XML-RPC call {} returned status {}", method, status);
            return Err(RegistryError::Status {
                url: self.index_url.clone(),
                status: status.as_u16(),
            });
        }

        xmlrpc::decode_response(&response.text().await?)
    }
}

fn expect_array(method: &str, value: XmlRpcValue) -> Result<Vec<XmlRpcValue>, RegistryError> {
    value.into_array().ok_or_else(|| {
        RegistryError::InvalidResponse(format!("{method} did not return an array"))
    })
}

#[async_trait]
impl Registry for PypiRegistry {
    async fn fetch_latest(&self, package_name: &str) -> Result<MetadataDocument, QypiError> {
        let response = self.get(&[package_name, "json"]).await?;

        // The JSON API accepts any spelling of a name, so 404 really means "no such package".
        if response.status() == StatusCode::NOT_FOUND {
            return Err(QypiError::PackageNotFound(package_name.to_string()));
        }

        Ok(Self::into_document(response).await?)
    }

    async fn fetch_version(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<MetadataDocument, QypiError> {
        let response = self.get(&[package_name, version, "json"]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(QypiError::VersionNotFound {
                package: package_name.to_string(),
                version: version.to_string(),
            });
        }

        Ok(Self::into_document(response).await?)
    }

    async fn list_packages(&self) -> Result<Vec<String>, RegistryError> {
        let response = self.xmlrpc("list_packages", &[]).await?;
        let packages = expect_array("list_packages", response)?;

        debug!("Index lists {} packages", packages.len());

        Ok(packages
            .into_iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Map<String, Value>>, RegistryError> {
        let spec: IndexMap<String, XmlRpcValue> = query
            .iter()
            .map(|(field, terms)| {
                let terms: Vec<XmlRpcValue> =
                    terms.iter().map(|t| XmlRpcValue::from(t.as_str())).collect();
                (field.as_str().to_string(), XmlRpcValue::Array(terms))
            })
            .collect();

        let response = self.xmlrpc("search", &[XmlRpcValue::Struct(spec)]).await?;
        let hits = expect_array("search", response)?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| match hit.into_json() {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect())
    }

    async fn browse(
        &self,
        classifiers: &[String],
    ) -> Result<Vec<(String, Option<String>)>, RegistryError> {
        let classifiers: Vec<XmlRpcValue> = classifiers
            .iter()
            .map(|c| XmlRpcValue::from(c.as_str()))
            .collect();

        let response = self.xmlrpc("browse", &[XmlRpcValue::Array(classifiers)]).await?;
        let releases = expect_array("browse", response)?;

        let mut pairs = Vec::with_capacity(releases.len());
        for release in releases {
            let mut fields = expect_array("browse", release)?.into_iter();
            let name = fields.next().and_then(|v| v.as_str().map(str::to_string));
            let version = fields
                .next()
                .and_then(|v| v.as_str().map(str::to_string))
                .filter(|v| !v.is_empty());
            match name {
                Some(name) => pairs.push((name, version)),
                None => {
                    return Err(RegistryError::InvalidResponse(
                        "browse returned a release without a name".to_string(),
                    ));
                }
            }
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn fetch_latest_returns_document() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {"name": "requests", "version": "2.32.5"},
                    "releases": {
                        "2.31.0": [],
                        "2.32.5": [{"upload_time": "2025-08-18T20:46:00"}]
                    },
                    "urls": []
                }"#,
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi/", server.url()));
        let doc = registry.fetch_latest("requests").await.unwrap();

        mock.assert_async().await;

        assert_eq!(doc.version(), Some("2.32.5"));
        assert_eq!(
            doc.releases.keys().collect::<Vec<_>>(),
            vec!["2.31.0", "2.32.5"]
        );
    }

    #[tokio::test]
    async fn fetch_latest_maps_404_to_package_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/missing/json")
            .with_status(404)
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let result = registry.fetch_latest("missing").await;

        mock.assert_async().await;

        assert!(matches!(result, Err(QypiError::PackageNotFound(name)) if name == "missing"));
    }

    #[tokio::test]
    async fn fetch_latest_maps_other_statuses_to_registry_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/flaky/json")
            .with_status(503)
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let result = registry.fetch_latest("flaky").await;

        mock.assert_async().await;

        assert!(matches!(
            result,
            Err(QypiError::Registry(RegistryError::Status { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn fetch_version_maps_404_to_version_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/pkgA/9.9.9/json")
            .with_status(404)
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let result = registry.fetch_version("pkgA", "9.9.9").await;

        mock.assert_async().await;

        assert!(matches!(
            result,
            Err(QypiError::VersionNotFound { package, version }) if package == "pkgA" && version == "9.9.9"
        ));
    }

    #[tokio::test]
    async fn fetch_version_maps_other_statuses_to_registry_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/pkgA/1.0/json")
            .with_status(503)
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let result = registry.fetch_version("pkgA", "1.0").await;

        mock.assert_async().await;

        assert!(matches!(
            result,
            Err(QypiError::Registry(RegistryError::Status { status: 503, .. }))
        ));
        assert!(!result.unwrap_err().is_domain());
    }

    #[tokio::test]
    async fn fetch_version_rejects_malformed_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/pkgA/1.0/json")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let result = registry.fetch_version("pkgA", "1.0").await;

        assert!(matches!(
            result,
            Err(QypiError::Registry(RegistryError::InvalidResponse(_)))
        ));
    }

    #[tokio::test]
    async fn session_is_reused_across_requests() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/pypi/.+/json$".to_string()))
            .with_status(404)
            .expect(2)
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let _ = registry.fetch_latest("a").await;
        let first = registry.session().await.unwrap() as *const Client;
        let _ = registry.fetch_latest("b").await;
        let second = registry.session().await.unwrap() as *const Client;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn list_packages_calls_xmlrpc() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/pypi")
            .match_body(Matcher::Regex("<methodName>list_packages</methodName>".to_string()))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(
                "<?xml version='1.0'?><methodResponse><params><param><value><array><data>\
                 <value><string>flask</string></value><value><string>requests</string></value>\
                 </data></array></value></param></params></methodResponse>",
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let packages = registry.list_packages().await.unwrap();

        mock.assert_async().await;

        assert_eq!(packages, vec!["flask", "requests"]);
    }

    #[tokio::test]
    async fn search_sends_terms_grouped_by_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/pypi")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("<methodName>search</methodName>".to_string()),
                Matcher::Regex(
                    "<member><name>name</name><value><array><data><value><string>flask</string>"
                        .to_string(),
                ),
            ]))
            .with_status(200)
            .with_body(
                "<methodResponse><params><param><value><array><data><value><struct>\
                 <member><name>name</name><value><string>Flask</string></value></member>\
                 <member><name>version</name><value><string>3.0.0</string></value></member>\
                 </struct></value></data></array></value></param></params></methodResponse>",
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let query = SearchQuery::from_terms(["name:flask"]).unwrap();
        let hits = registry.search(&query).await.unwrap();

        mock.assert_async().await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get("name"), Some(&Value::from("Flask")));
    }

    #[tokio::test]
    async fn browse_maps_empty_versions_to_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/pypi")
            .with_status(200)
            .with_body(
                "<methodResponse><params><param><value><array><data>\
                 <value><array><data><value><string>foo</string></value><value><string>1.0</string></value></data></array></value>\
                 <value><array><data><value><string>bar</string></value><value><string></string></value></data></array></value>\
                 </data></array></value></param></params></methodResponse>",
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let releases = registry
            .browse(&["Framework :: Django".to_string()])
            .await
            .unwrap();

        assert_eq!(
            releases,
            vec![
                ("foo".to_string(), Some("1.0".to_string())),
                ("bar".to_string(), None)
            ]
        );
    }

    #[tokio::test]
    async fn xmlrpc_fault_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/pypi")
            .with_status(200)
            .with_body(
                "<methodResponse><fault><value><struct>\
                 <member><name>faultCode</name><value><int>-32500</int></value></member>\
                 <member><name>faultString</name><value><string>RuntimeError: disabled</string></value></member>\
                 </struct></value></fault></methodResponse>",
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&format!("{}/pypi", server.url()));
        let result = registry.list_packages().await;

        assert!(matches!(result, Err(RegistryError::Fault { code: -32500, .. })));
    }
}
