//! Set-aside filtering.

use crate::RawOpportunity;

/// Markers identifying veteran-owned set-asides in
/// `typeOfSetAsideDescription`.
pub const VETERAN_MARKERS: &[&str] = &["Veteran-Owned", "Service-Disabled Veteran-Owned"];

/// True if the record's set-aside description contains any marker.
///
/// Matching is a case-sensitive substring test. Records without a string
/// set-aside description never match.
pub fn matches_set_aside<S: AsRef<str>>(record: &RawOpportunity, markers: &[S]) -> bool {
    record
        .type_of_set_aside_description
        .as_deref()
        .is_some_and(|desc| markers.iter().any(|m| desc.contains(m.as_ref())))
}

/// Keep only records whose set-aside matches one of `markers`, in order.
pub fn filter_set_asides<S: AsRef<str>>(
    mut records: Vec<RawOpportunity>,
    markers: &[S],
) -> Vec<RawOpportunity> {
    records.retain(|r| matches_set_aside(r, markers));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_set_aside(id: &str, set_aside: Option<&str>) -> RawOpportunity {
        RawOpportunity {
            notice_id: Some(id.into()),
            type_of_set_aside_description: set_aside.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn service_disabled_passes() {
        let r = with_set_aside("1", Some("Service-Disabled Veteran-Owned Small Business"));
        assert!(matches_set_aside(&r, VETERAN_MARKERS));
    }

    #[test]
    fn eight_a_and_absent_are_rejected() {
        assert!(!matches_set_aside(
            &with_set_aside("1", Some("8(a) Business Development")),
            VETERAN_MARKERS
        ));
        assert!(!matches_set_aside(&with_set_aside("2", None), VETERAN_MARKERS));
    }

    #[test]
    fn match_is_case_sensitive() {
        let r = with_set_aside("1", Some("veteran-owned small business"));
        assert!(!matches_set_aside(&r, VETERAN_MARKERS));
    }

    #[test]
    fn match_is_substring_not_word() {
        let r = with_set_aside("1", Some("NonVeteran-Owned"));
        assert!(matches_set_aside(&r, VETERAN_MARKERS));
    }

    #[test]
    fn filter_preserves_order_and_duplicates() {
        let records = vec![
            with_set_aside("a", Some("Veteran-Owned Small Business")),
            with_set_aside("b", Some("Total Small Business")),
            with_set_aside("c", Some("Service-Disabled Veteran-Owned Small Business")),
            with_set_aside("a", Some("Veteran-Owned Small Business")),
            with_set_aside("d", None),
        ];
        let kept = filter_set_asides(records, VETERAN_MARKERS);
        let ids: Vec<_> = kept.iter().filter_map(|r| r.notice_id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "c", "a"]);
    }

    #[test]
    fn custom_markers() {
        let markers = vec!["HUBZone".to_string()];
        let records = vec![
            with_set_aside("a", Some("HUBZone Set-Aside")),
            with_set_aside("b", Some("Veteran-Owned Small Business")),
        ];
        let kept = filter_set_asides(records, &markers);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].notice_id.as_deref(), Some("a"));
    }
}
