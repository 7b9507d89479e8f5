/// What the hosting runtime should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Close the notification, nothing else
    Dismiss,
    /// Bring the window at this index (into the supplied list) to the front
    Focus(usize),
    /// No window is showing the target — open a new one at this URL
    Open(String),
}

/// Decide the outcome of a notification click.
///
/// The `close` action dismisses only. Any other action (including a plain
/// body click, `action = None`) navigates: prefer focusing a window already
/// at the target URL, otherwise open a new one.
pub fn resolve_click(
    action: Option<&str>,
    target_url: Option<&str>,
    open_windows: &[String],
) -> ClickOutcome {
    if action == Some("close") {
        return ClickOutcome::Dismiss;
    }

    let url = target_url.unwrap_or(crate::payload::DEFAULT_URL);
    match open_windows.iter().position(|w| w == url) {
        Some(idx) => ClickOutcome::Focus(idx),
        None => ClickOutcome::Open(url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_action_only_dismisses() {
        let windows = vec!["/messages/1".to_string()];
        assert_eq!(
            resolve_click(Some("close"), Some("/messages/1"), &windows),
            ClickOutcome::Dismiss
        );
    }

    #[test]
    fn open_action_focuses_matching_window() {
        let windows = vec!["/feed".to_string(), "/messages/1".to_string()];
        assert_eq!(
            resolve_click(Some("open"), Some("/messages/1"), &windows),
            ClickOutcome::Focus(1)
        );
    }

    #[test]
    fn body_click_with_no_match_opens_new_window() {
        let windows = vec!["/feed".to_string()];
        assert_eq!(
            resolve_click(None, Some("/messages/2"), &windows),
            ClickOutcome::Open("/messages/2".into())
        );
    }

    #[test]
    fn missing_url_defaults_to_root() {
        assert_eq!(resolve_click(None, None, &[]), ClickOutcome::Open("/".into()));
    }
}
