use crate::core::domain::error::ValidationError;

const MAX_NODE_NAME_LENGTH: usize = 253;

/// Validates a node name used as the store key.
///
/// Names follow Kubernetes node naming: 1 to 253 characters drawn from
/// ASCII alphanumerics, `-`, `.` and `_`.
pub(crate) fn validate_node_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Field {
            field: "name".to_string(),
            message: "Node name cannot be empty".to_string(),
        });
    }

    if name.len() > MAX_NODE_NAME_LENGTH {
        return Err(ValidationError::Format(format!(
            "Node name exceeds maximum length of {} characters",
            MAX_NODE_NAME_LENGTH
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
    {
        return Err(ValidationError::Format(format!(
            "Node name '{}' contains invalid characters",
            name
        )));
    }

    Ok(())
}

/// Validates a management address: it must be usable as the host part of an
/// `http://` agent URL.
pub(crate) fn validate_management_address(address: &str) -> Result<(), ValidationError> {
    if address.is_empty() {
        return Err(ValidationError::Field {
            field: "management_ip_address".to_string(),
            message: "Management address cannot be empty".to_string(),
        });
    }

    let parsed = url::Url::parse(&format!("http://{}/", host_literal(address))).map_err(|e| {
        ValidationError::Format(format!("Invalid management address '{}': {}", address, e))
    })?;

    if parsed.host_str().is_none() || parsed.port().is_some() || parsed.path() != "/" {
        return Err(ValidationError::Format(format!(
            "Management address '{}' must be a bare host",
            address
        )));
    }

    Ok(())
}

/// Wraps IPv6 literals in brackets for use in a URL authority.
pub(crate) fn host_literal(address: &str) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{}]", address)
    } else {
        address.to_string()
    }
}
