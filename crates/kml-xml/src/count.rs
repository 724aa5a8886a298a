//! Element occurrence counts.

use crate::{Document, TreeEvent};
use std::collections::BTreeMap;

/// Element counts keyed by namespace, then local name.
pub type ElementCounts = BTreeMap<Option<String>, BTreeMap<String, usize>>;

/// Count the elements of a document by namespace and local name.
///
/// ```rust
/// use kml_xml::{count_elements, parse};
///
/// let doc = parse("<a><b/><b/><c/></a>").unwrap();
/// let counts = count_elements(&doc);
/// assert_eq!(counts[&None]["b"], 2);
/// assert_eq!(counts[&None]["a"], 1);
/// ```
pub fn count_elements(doc: &Document) -> ElementCounts {
    let mut counts = ElementCounts::new();
    for event in doc.events() {
        if let TreeEvent::Open(element) = event {
            *counts
                .entry(element.name.namespace.clone())
                .or_default()
                .entry(element.name.local.clone())
                .or_default() += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{GX_NAMESPACE, KML_NAMESPACE};
    use crate::parse;

    #[test]
    fn test_counts_by_namespace() {
        let doc = parse(&format!(
            r#"<kml xmlns="{KML_NAMESPACE}" xmlns:gx="{GX_NAMESPACE}">
  <!-- comments are not counted -->
  <Document>
    <Placemark><name>a</name></Placemark>
    <Placemark><name>b</name><gx:balloonVisibility>1</gx:balloonVisibility></Placemark>
  </Document>
</kml>"#
        ))
        .unwrap();

        let counts = count_elements(&doc);
        let kml = &counts[&Some(KML_NAMESPACE.to_string())];
        assert_eq!(kml["kml"], 1);
        assert_eq!(kml["Placemark"], 2);
        assert_eq!(kml["name"], 2);
        assert_eq!(counts[&Some(GX_NAMESPACE.to_string())]["balloonVisibility"], 1);
        assert_eq!(counts.len(), 2);
    }
}
