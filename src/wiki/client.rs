//! HTTP transport for the Confluence `confluence1` XML-RPC service.

use super::xmlrpc::{self, XmlRpcValue};
use super::{Page, RpcError, WikiRpc};
use crate::types::WikiTarget;
use log::{debug, warn};
use std::sync::Arc;

const USER_AGENT: &str = concat!("wikistats/", env!("CARGO_PKG_VERSION"));

/// Remote service name prefixed to every method
const SERVICE: &str = "confluence1";

/// Blocking XML-RPC client bound to one endpoint URL
pub struct XmlRpcClient {
    agent: ureq::Agent,
    url: String,
}

impl XmlRpcClient {
    /// Build a client for the target's URL.
    ///
    /// With `insecure` set, certificate and hostname checks are disabled.
    pub fn new(target: &WikiTarget) -> Result<Self, RpcError> {
        if target.url.is_empty() {
            return Err(RpcError::Transport("no wiki URL configured".to_string()));
        }

        let mut builder = ureq::AgentBuilder::new().user_agent(USER_AGENT);

        if target.insecure {
            warn!("TLS certificate verification is disabled for {}", target.url);
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| RpcError::Transport(format!("Failed to build TLS connector: {}", e)))?;
            builder = builder.tls_connector(Arc::new(connector));
        }

        Ok(Self { agent: builder.build(), url: target.url.clone() })
    }

    #[cfg(test)]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST one method call and decode its result
    pub fn call(&self, method: &str, params: &[XmlRpcValue]) -> Result<XmlRpcValue, RpcError> {
        let method = format!("{}.{}", SERVICE, method);
        debug!("XML-RPC call {} -> {}", method, self.url);

        let body = xmlrpc::encode_call(&method, params);
        let response = self.agent.post(&self.url).set("Content-Type", "text/xml; charset=utf-8").send_string(&body);

        let text = match response {
            Ok(resp) => resp.into_string().map_err(|e| RpcError::Transport(format!("Failed to read response: {}", e)))?,
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                // Some servers send faults with a 500 status
                if let Err(fault @ RpcError::Fault { .. }) = xmlrpc::parse_response(&body) {
                    return Err(fault);
                }
                return Err(RpcError::Http { status, body });
            }
            Err(e) => return Err(RpcError::Transport(e.to_string())),
        };

        xmlrpc::parse_response(&text)
    }
}

impl WikiRpc for XmlRpcClient {
    fn login(&self, username: &str, password: &str) -> Result<String, RpcError> {
        let token = self.call("login", &[username.into(), password.into()])?;
        token.as_str().map(str::to_string).ok_or_else(|| RpcError::Malformed(format!("login returned {:?}", token)))
    }

    fn logout(&self, token: &str) -> Result<(), RpcError> {
        self.call("logout", &[token.into()])?;
        Ok(())
    }

    fn get_page(&self, token: &str, space: &str, title: &str) -> Result<Page, RpcError> {
        let value = self.call("getPage", &[token.into(), space.into(), title.into()])?;
        Page::from_value(value)
    }

    fn store_page(&self, token: &str, page: &Page) -> Result<Page, RpcError> {
        let value = self.call("storePage", &[token.into(), page.to_value()])?;
        Page::from_value(value)
    }
}
