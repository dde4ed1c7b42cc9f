//! Metric name reshaping.

/// Convert an underscore-delimited metric name into the camel-case form
/// used in reports: `queue_avoided_bytes` becomes `queueAvoidedBytes`.
/// Characters following an underscore are upper-cased, underscores are
/// dropped, everything else is lower-cased.
pub fn normalize_metric_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscores_become_camel_case() {
        assert_eq!(normalize_metric_name("queue_avoided_bytes"), "queueAvoidedBytes");
        assert_eq!(normalize_metric_name("q_time"), "qTime");
    }

    #[test]
    fn test_existing_case_is_flattened() {
        assert_eq!(normalize_metric_name("noUnderscores"), "nounderscores");
    }

    #[test]
    fn test_edge_shapes() {
        assert_eq!(normalize_metric_name(""), "");
        assert_eq!(normalize_metric_name("_x"), "X");
        assert_eq!(normalize_metric_name("a__b"), "aB");
        assert_eq!(normalize_metric_name("trailing_"), "trailing");
    }
}
