//! Well-Known Text for KML geometries.

use crate::namespaces::KML_NAMESPACE;
use crate::{Document, Element, QName, TreeEvent};
use tracing::warn;

/// Wrap an angle in degrees into `[-180, 180)`.
///
/// ```rust
/// use kml_xml::wrap_angle180;
///
/// assert_eq!(wrap_angle180(190.0), -170.0);
/// assert_eq!(wrap_angle180(-190.0), 170.0);
/// assert_eq!(wrap_angle180(180.0), -180.0);
/// ```
pub fn wrap_angle180(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Every KML `Polygon` of the document as a WKT `POLYGON`, in document
/// order: the outer boundary first, then each inner boundary.
///
/// Coordinate tuples keep all their components, so
/// `1,2,0 3,4,0` becomes `(1 2 0, 3 4 0)`. A polygon without an outer
/// boundary ring is skipped.
///
/// ```rust
/// use kml_xml::{parse, to_wkt_list};
///
/// let doc = parse(r#"<Polygon xmlns="http://www.opengis.net/kml/2.2">
///   <outerBoundaryIs><LinearRing>
///     <coordinates>0,0 1,0 1,1 0,0</coordinates>
///   </LinearRing></outerBoundaryIs>
/// </Polygon>"#).unwrap();
/// assert_eq!(to_wkt_list(&doc), ["POLYGON ((0 0, 1 0, 1 1, 0 0))"]);
/// ```
pub fn to_wkt_list(doc: &Document) -> Vec<String> {
    let polygon = kml_name("Polygon");
    doc.events()
        .filter_map(|event| match event {
            TreeEvent::Open(element) if element.name == polygon => polygon_to_wkt(element),
            _ => None,
        })
        .collect()
}

fn kml_name(local: &str) -> QName {
    QName::new(Some(KML_NAMESPACE), local)
}

fn kml_children<'a>(element: &'a Element, local: &str) -> impl Iterator<Item = &'a Element> {
    let name = kml_name(local);
    element.child_elements().filter(move |child| child.name == name)
}

/// `(x y z, ...)` for the ring inside an `outerBoundaryIs` or
/// `innerBoundaryIs` element.
fn boundary_ring(boundary: &Element) -> Option<String> {
    let ring = kml_children(boundary, "LinearRing").next()?;
    let coordinates = kml_children(ring, "coordinates").next()?;
    let tuples: Vec<String> = coordinates
        .text()
        .unwrap_or_default()
        .split_whitespace()
        .map(|tuple| tuple.replace(',', " "))
        .collect();
    Some(format!("({})", tuples.join(", ")))
}

fn polygon_to_wkt(polygon: &Element) -> Option<String> {
    let Some(outer) = kml_children(polygon, "outerBoundaryIs")
        .next()
        .and_then(boundary_ring)
    else {
        warn!("skipping Polygon without an outer boundary ring");
        return None;
    };

    let mut rings = vec![outer];
    rings.extend(kml_children(polygon, "innerBoundaryIs").filter_map(boundary_ring));
    Some(format!("POLYGON ({})", rings.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn kml(body: &str) -> Document {
        parse(&format!(r#"<kml xmlns="{KML_NAMESPACE}">{body}</kml>"#)).unwrap()
    }

    #[test]
    fn test_polygon_with_hole() {
        let doc = kml(
            "<Placemark><Polygon>
               <outerBoundaryIs><LinearRing><coordinates>
                 -77.05,38.87,100 -77.06,38.87,100
                 -77.06,38.86,100 -77.05,38.87,100
               </coordinates></LinearRing></outerBoundaryIs>
               <innerBoundaryIs><LinearRing><coordinates>
                 -77.055,38.868,100 -77.056,38.867,100 -77.055,38.868,100
               </coordinates></LinearRing></innerBoundaryIs>
             </Polygon></Placemark>",
        );

        assert_eq!(
            to_wkt_list(&doc),
            [
                "POLYGON ((-77.05 38.87 100, -77.06 38.87 100, -77.06 38.86 100, -77.05 38.87 100), \
                 (-77.055 38.868 100, -77.056 38.867 100, -77.055 38.868 100))"
            ]
        );
    }

    #[test]
    fn test_polygons_in_document_order() {
        let ring = "<outerBoundaryIs><LinearRing><coordinates>{}</coordinates></LinearRing></outerBoundaryIs>";
        let doc = kml(&format!(
            "<Folder><Placemark><MultiGeometry><Polygon>{}</Polygon><Point><coordinates>5,5</coordinates></Point></MultiGeometry></Placemark></Folder><Placemark><Polygon>{}</Polygon></Placemark>",
            ring.replace("{}", "0,0 1,1 0,0"),
            ring.replace("{}", "2,2 3,3 2,2"),
        ));

        assert_eq!(
            to_wkt_list(&doc),
            ["POLYGON ((0 0, 1 1, 0 0))", "POLYGON ((2 2, 3 3, 2 2))"]
        );
    }

    #[test]
    fn test_polygon_without_outer_boundary_is_skipped() {
        let doc = kml("<Polygon><innerBoundaryIs/></Polygon><x:Polygon xmlns:x=\"urn:x\"/>");
        assert!(to_wkt_list(&doc).is_empty());
    }

    #[test]
    fn test_wrap_angle180() {
        assert_eq!(wrap_angle180(0.0), 0.0);
        assert_eq!(wrap_angle180(179.5), 179.5);
        assert_eq!(wrap_angle180(540.0), -180.0);
        assert_eq!(wrap_angle180(-180.0), -180.0);
        assert_eq!(wrap_angle180(-541.0), 179.0);
    }
}
