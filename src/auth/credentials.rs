//! Application credentials exchanged for client-credentials tokens.

// self
use crate::_prelude::*;

/// App identifier + cert identifier pair issued by the marketplace developer portal.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
	/// Public application identifier (`client_id`).
	pub app_id: String,
	cert_id: String,
}
impl ClientCredentials {
	/// Pairs an application identifier with its secret cert identifier.
	pub fn new(app_id: impl Into<String>, cert_id: impl Into<String>) -> Self {
		Self { app_id: app_id.into(), cert_id: cert_id.into() }
	}

	/// Returns the cert identifier (`client_secret`). Callers must avoid logging it.
	pub fn cert_id(&self) -> &str {
		&self.cert_id
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("app_id", &self.app_id)
			.field("cert_id", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_hides_cert_id() {
		let credentials = ClientCredentials::new("app-123", "PRD-secret");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("app-123"));
		assert!(!rendered.contains("PRD-secret"));
		assert_eq!(credentials.cert_id(), "PRD-secret");
	}
}
