//! Registry test utilities backed by a mockito server

use std::sync::Arc;

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{Map, Value, json};

use qypi::version::registries::PypiRegistry;
use qypi::version::resolver::PackageResolver;

/// Body of `GET /pypi/{name}/json`
pub fn latest_body(name: &str, version: &str, releases: &[(&str, &str)]) -> String {
    let releases: Map<String, Value> = releases
        .iter()
        .map(|(v, uploaded)| {
            let files = json!([{"filename": format!("{name}-{v}.tar.gz"), "upload_time": uploaded}]);
            (v.to_string(), files)
        })
        .collect();

    json!({
        "info": {
            "name": name,
            "version": version,
            "summary": "",
            "author": "Jane",
            "author_email": "UNKNOWN",
            "home_page": format!("https://example.com/{name}"),
            "project_url": format!("https://pypi.org/project/{name}/"),
            "description": format!("README for {name} {version}"),
            "_pypi_hidden": false
        },
        "releases": releases,
        "urls": []
    })
    .to_string()
}

/// Body of `GET /pypi/{name}/{version}/json`, in the legacy index's shape
pub fn release_body(name: &str, version: &str, upload_times: &[&str]) -> String {
    let urls: Vec<Value> = upload_times
        .iter()
        .enumerate()
        .map(|(i, time)| {
            json!({
                "filename": format!("{name}-{version}-{i}.whl"),
                "upload_time": time,
                "downloads": -1,
                "path": format!("x/y/{name}-{version}-{i}.whl"),
                "comment_text": "",
                "size": 1024
            })
        })
        .collect();

    json!({
        "info": {
            "name": name,
            "version": version,
            "author": "Jane",
            "author_email": "",
            "maintainer": "",
            "maintainer_email": "ops@example.com",
            "home_page": "UNKNOWN",
            "package_url": format!("https://pypi.python.org/pypi/{name}"),
            "description": format!("README for {name} {version}"),
            "downloads": {"last_day": -1},
            "cheesecake_installability_id": 1
        },
        "urls": urls
    })
    .to_string()
}

pub async fn mock_json(server: &mut ServerGuard, path: &str, body: String) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

pub async fn mock_status(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .create_async()
        .await
}

/// Mock an XML-RPC method; `value` is the `<value>` element of the single response param
pub async fn mock_xmlrpc(server: &mut ServerGuard, method: &str, value: &str) -> Mock {
    server
        .mock("POST", "/pypi")
        .match_body(Matcher::Regex(format!("<methodName>{method}</methodName>")))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(format!(
            "<?xml version='1.0'?><methodResponse><params><param>{value}</param></params></methodResponse>"
        ))
        .create_async()
        .await
}

/// Resolver talking to the mock server's `/pypi` endpoint
pub fn resolver_for(server: &ServerGuard) -> PackageResolver {
    PackageResolver::new(Arc::new(PypiRegistry::new(&format!(
        "{}/pypi",
        server.url()
    ))))
}
