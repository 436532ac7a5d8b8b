use tracing::debug;

use crate::config::types::LayoutMarkers;
use crate::domain::layout::LayoutKind;
use crate::ports::browser::{BrowserPage, Locator};

fn marker(markers: &LayoutMarkers, kind: LayoutKind) -> Option<&str> {
    match kind {
        LayoutKind::LayoutB => Some(&markers.layout_b),
        LayoutKind::LayoutA => Some(&markers.layout_a),
        LayoutKind::Unrecognized => None,
    }
}

/// Which known layout the live page is showing.
///
/// Markers are counted on every call, in [`LayoutKind::PRIORITY`] order. A
/// failed marker count is treated as no match.
pub async fn detect_layout(page: &dyn BrowserPage, markers: &LayoutMarkers) -> LayoutKind {
    for kind in LayoutKind::PRIORITY {
        let Some(css) = marker(markers, kind) else {
            continue;
        };
        match page.count(&Locator::css(css)).await {
            Ok(n) if n > 0 => {
                debug!(layout = %kind, cards = n, "Layout marker present");
                return kind;
            }
            Ok(_) => {}
            Err(e) => debug!(layout = %kind, error = %e, "Layout marker check failed"),
        }
    }
    LayoutKind::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakePage;

    #[tokio::test]
    async fn layout_b_wins_over_a() {
        let page = FakePage::new(
            r#"<div data-resultid="1"></div><div class="resultWrapper"></div>"#,
        );
        let kind = detect_layout(&page, &LayoutMarkers::default()).await;
        assert_eq!(kind, LayoutKind::LayoutB);
    }

    #[tokio::test]
    async fn layout_a_alone() {
        let page = FakePage::new(r#"<div class="resultWrapper"></div>"#);
        let kind = detect_layout(&page, &LayoutMarkers::default()).await;
        assert_eq!(kind, LayoutKind::LayoutA);
    }

    #[tokio::test]
    async fn nothing_matches() {
        let page = FakePage::new("<div>loading</div>");
        let kind = detect_layout(&page, &LayoutMarkers::default()).await;
        assert_eq!(kind, LayoutKind::Unrecognized);
    }

    #[tokio::test]
    async fn detection_follows_page_changes() {
        let page = FakePage::new("<div>loading</div>");
        let markers = LayoutMarkers::default();
        assert_eq!(detect_layout(&page, &markers).await, LayoutKind::Unrecognized);
        page.set_html(r#"<div class="resultWrapper"></div>"#);
        assert_eq!(detect_layout(&page, &markers).await, LayoutKind::LayoutA);
    }

    #[tokio::test]
    async fn failing_marker_count_is_no_match() {
        let page = FakePage::new(r#"<div class="resultWrapper"></div>"#);
        page.fail_on("div[data-resultid]");
        let kind = detect_layout(&page, &LayoutMarkers::default()).await;
        assert_eq!(kind, LayoutKind::LayoutA);
    }
}
