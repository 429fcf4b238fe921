/// Resolve one task parameter.
///
/// A value passed at call time wins over the default stored on the task. If
/// neither is set the parameter stays unset.
pub fn resolve<T: Clone>(call_time: Option<T>, default: &Option<T>) -> Option<T> {
  call_time.or_else(|| default.clone())
}

/// Returns the value if it is present and not empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_call_time_overrides_default() {
    let default = Some("default".to_string());
    assert_eq!(resolve(Some("call".to_string()), &default).as_deref(), Some("call"));
  }

  #[test]
  fn test_default_used_when_absent() {
    let default = Some("default".to_string());
    assert_eq!(resolve(None, &default).as_deref(), Some("default"));
  }

  #[test]
  fn test_both_absent() {
    assert_eq!(resolve::<String>(None, &None), None);
  }

  #[test]
  fn test_non_empty() {
    assert_eq!(non_empty(&Some(String::new())), None);
    assert_eq!(non_empty(&None), None);
    assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
  }
}
