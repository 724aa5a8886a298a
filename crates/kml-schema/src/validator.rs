// Document validation engine

use crate::error::{ValidationIssue, ValidationIssueKind};
use crate::model::{
    AttributeUse, ComplexType, Content, Derivation, ElementDecl, Particle, ProcessContents,
    SchemaSet, TypeDef, TypeRef, is_any_type, is_builtin,
};
use kml_error_reporting::SourceInfo;
use kml_xml::{Document, Element, QName};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Derivation chains and group references deeper than this are cut off.
const MAX_REFERENCE_DEPTH: usize = 64;

/// Validate a document against a loaded schema set.
pub fn validate_document(doc: &Document, set: &SchemaSet) -> Vec<ValidationIssue> {
    let mut context = ValidationContext::new(set);
    context.run(&doc.root);
    context.issues
}

/// What an element is checked against.
enum Target<'s> {
    Declared(&'s ElementDecl),
    /// Admitted by a lax wildcard or `anyType`: checked only if globally declared
    Lax,
    /// Not descended into
    Skip,
}

struct PendingElement<'d, 's> {
    element: &'d Element,
    target: Target<'s>,
    path: String,
}

enum ContentModel<'s> {
    Any,
    TextOnly,
    Particles(Vec<&'s Particle>),
}

/// A type with its derivation chain and attribute groups folded in.
struct Effective<'s> {
    content: ContentModel<'s>,
    attributes: Vec<&'s AttributeUse>,
    any_attribute: bool,
}

impl Effective<'_> {
    fn any() -> Self {
        Self {
            content: ContentModel::Any,
            attributes: Vec::new(),
            any_attribute: true,
        }
    }

    fn text_only() -> Self {
        Self {
            content: ContentModel::TextOnly,
            attributes: Vec::new(),
            any_attribute: false,
        }
    }

    fn empty() -> Self {
        Self {
            content: ContentModel::Particles(Vec::new()),
            attributes: Vec::new(),
            any_attribute: false,
        }
    }
}

enum ChildMatch<'s> {
    Declared(&'s ElementDecl),
    Wildcard(ProcessContents),
    /// The content model names a component that is not loaded
    Unresolved,
    NotAllowed,
}

/// Validation context tracks state during validation
struct ValidationContext<'s> {
    set: &'s SchemaSet,
    issues: Vec<ValidationIssue>,
    /// Unresolved components already reported
    reported: HashSet<String>,
}

impl<'s> ValidationContext<'s> {
    fn new(set: &'s SchemaSet) -> Self {
        Self {
            set,
            issues: Vec::new(),
            reported: HashSet::new(),
        }
    }

    fn add_issue(&mut self, kind: ValidationIssueKind, path: &str, location: Option<&SourceInfo>) {
        debug!(path, code = kind.error_code(), "validation issue");
        self.issues
            .push(ValidationIssue::new(kind, path).with_location(location.cloned()));
    }

    fn unresolved(&mut self, kind: &'static str, name: &QName, path: &str) {
        if self.reported.insert(format!("{}:{}", kind, name)) {
            self.add_issue(
                ValidationIssueKind::UnresolvedComponent {
                    kind,
                    name: name.to_string(),
                },
                path,
                None,
            );
        }
    }

    fn run<'d>(&mut self, root: &'d Element) {
        let set = self.set;
        let root_path = format!("/{}", root.local_name());
        let Some(decl) = set.elements.get(&root.name) else {
            self.add_issue(
                ValidationIssueKind::UndeclaredRoot {
                    element: root.name.to_string(),
                },
                &root_path,
                root.source_info.as_ref(),
            );
            return;
        };

        let mut stack: Vec<PendingElement<'d, 's>> = vec![PendingElement {
            element: root,
            target: Target::Declared(decl),
            path: root_path,
        }];

        while let Some(PendingElement {
            element,
            target,
            path,
        }) = stack.pop()
        {
            let children = match target {
                Target::Declared(decl) => self.check_declared(element, decl, &path),
                Target::Lax => match set.elements.get(&element.name) {
                    Some(decl) => self.check_declared(element, decl, &path),
                    None => element.child_elements().map(|_| Target::Lax).collect(),
                },
                Target::Skip => continue,
            };

            let paths = child_paths(element, &path);
            let pending: Vec<_> = element
                .child_elements()
                .zip(children)
                .zip(paths)
                .filter(|((_, target), _)| !matches!(target, Target::Skip))
                .map(|((element, target), path)| PendingElement {
                    element,
                    target,
                    path,
                })
                .collect();
            // Reversed so that elements are checked in document order.
            stack.extend(pending.into_iter().rev());
        }
    }

    /// Check one element against its declaration and return one target per
    /// child element (none when the children are not descended into).
    fn check_declared(
        &mut self,
        element: &Element,
        decl: &'s ElementDecl,
        path: &str,
    ) -> Vec<Target<'s>> {
        let set = self.set;
        if decl.is_abstract {
            self.add_issue(
                ValidationIssueKind::AbstractElement {
                    element: element.local_name().to_string(),
                },
                path,
                element.source_info.as_ref(),
            );
            return Vec::new();
        }

        let effective = self.element_type(decl, path);
        self.check_attributes(element, &effective, path);

        match &effective.content {
            ContentModel::Any => element
                .child_elements()
                .map(|child| match set.elements.get(&child.name) {
                    Some(decl) => Target::Declared(decl),
                    None => Target::Lax,
                })
                .collect(),

            ContentModel::TextOnly => {
                if let Some(child) = element.child_elements().next() {
                    self.add_issue(
                        ValidationIssueKind::ChildInTextOnly {
                            element: element.local_name().to_string(),
                            child: child.local_name().to_string(),
                        },
                        path,
                        child.source_info.as_ref(),
                    );
                }
                Vec::new()
            }

            ContentModel::Particles(particles) => {
                let mut targets = Vec::new();
                for (child, child_path) in element.child_elements().zip(child_paths(element, path))
                {
                    let target = match self.match_child(particles, &child.name, path, 0) {
                        ChildMatch::Declared(decl) => Target::Declared(decl),
                        ChildMatch::Wildcard(ProcessContents::Skip) => {
                            debug!(path = %child_path, "skipping wildcard content");
                            Target::Skip
                        }
                        ChildMatch::Wildcard(_) => Target::Lax,
                        ChildMatch::Unresolved => Target::Skip,
                        ChildMatch::NotAllowed => {
                            self.add_issue(
                                ValidationIssueKind::UnexpectedChild {
                                    element: child.local_name().to_string(),
                                    parent: element.local_name().to_string(),
                                },
                                &child_path,
                                child.source_info.as_ref(),
                            );
                            Target::Skip
                        }
                    };
                    targets.push(target);
                }
                targets
            }
        }
    }

    fn check_attributes(&mut self, element: &Element, effective: &Effective<'s>, path: &str) {
        if matches!(effective.content, ContentModel::Any) {
            return;
        }

        for required in effective.attributes.iter().filter(|a| a.required()) {
            if element.get_attribute_qualified(required.name()).is_none() {
                self.add_issue(
                    ValidationIssueKind::MissingAttribute {
                        attribute: display_name(required.name()),
                        element: element.local_name().to_string(),
                    },
                    path,
                    element.source_info.as_ref(),
                );
            }
        }

        if effective.any_attribute {
            return;
        }
        for attribute in &element.attributes {
            let foreign = attribute.name.namespace().is_some()
                && attribute.name.namespace() != element.namespace();
            let declared = effective
                .attributes
                .iter()
                .any(|declared| declared.name() == &attribute.name);
            if !foreign && !declared {
                self.add_issue(
                    ValidationIssueKind::UndeclaredAttribute {
                        attribute: display_name(&attribute.name),
                        element: element.local_name().to_string(),
                    },
                    path,
                    element.source_info.as_ref(),
                );
            }
        }
    }

    fn match_child(
        &mut self,
        particles: &[&'s Particle],
        name: &QName,
        path: &str,
        depth: usize,
    ) -> ChildMatch<'s> {
        let set = self.set;
        for &particle in particles {
            let found = match particle {
                Particle::Element(decl) if &decl.name == name => ChildMatch::Declared(decl),
                Particle::Element(_) => ChildMatch::NotAllowed,

                Particle::ElementRef(head) => {
                    if head == name || set.substitutes_for(name, head) {
                        match set.elements.get(name) {
                            Some(decl) => ChildMatch::Declared(decl),
                            None => {
                                self.unresolved("element", name, path);
                                ChildMatch::Unresolved
                            }
                        }
                    } else {
                        ChildMatch::NotAllowed
                    }
                }

                Particle::Compositor(nested) if depth < MAX_REFERENCE_DEPTH => {
                    let nested: Vec<&'s Particle> = nested.iter().collect();
                    self.match_child(&nested, name, path, depth + 1)
                }

                Particle::GroupRef(group) if depth < MAX_REFERENCE_DEPTH => {
                    match set.groups.get(group) {
                        Some(particle) => self.match_child(&[particle], name, path, depth + 1),
                        None => {
                            self.unresolved("group", group, path);
                            ChildMatch::Unresolved
                        }
                    }
                }

                Particle::Compositor(_) | Particle::GroupRef(_) => ChildMatch::NotAllowed,

                Particle::Any(wildcard) if wildcard.namespaces.allows(name.namespace()) => {
                    ChildMatch::Wildcard(wildcard.process)
                }
                Particle::Any(_) => ChildMatch::NotAllowed,
            };
            if !matches!(found, ChildMatch::NotAllowed) {
                return found;
            }
        }
        ChildMatch::NotAllowed
    }

    fn element_type(&mut self, decl: &'s ElementDecl, path: &str) -> Effective<'s> {
        let set = self.set;
        let mut decl = decl;
        for _ in 0..MAX_REFERENCE_DEPTH {
            match &decl.type_ref {
                TypeRef::Named(name) => return self.named_type(name, path, 0),
                TypeRef::Anonymous(def) => return self.type_def(def, path, 0),
                TypeRef::Unspecified => {
                    let Some(head) = &decl.substitution_group else {
                        return Effective::any();
                    };
                    match set.elements.get(head) {
                        Some(head_decl) => decl = head_decl,
                        None => {
                            self.unresolved("element", head, path);
                            return Effective::any();
                        }
                    }
                }
            }
        }
        Effective::any()
    }

    fn named_type(&mut self, name: &QName, path: &str, depth: usize) -> Effective<'s> {
        if is_any_type(name) {
            return Effective::any();
        }
        if is_builtin(name) {
            return Effective::text_only();
        }
        let set = self.set;
        match set.types.get(name) {
            Some(def) => self.type_def(def, path, depth),
            None => {
                self.unresolved("type", name, path);
                Effective::any()
            }
        }
    }

    fn type_def(&mut self, def: &'s TypeDef, path: &str, depth: usize) -> Effective<'s> {
        match def {
            TypeDef::Simple => Effective::text_only(),
            TypeDef::Complex(complex) => self.complex_type(complex, path, depth),
        }
    }

    fn complex_type(&mut self, complex: &'s ComplexType, path: &str, depth: usize) -> Effective<'s> {
        let own_content = match &complex.content {
            Content::Empty => None,
            Content::Simple => Some(ContentModel::TextOnly),
            Content::Particle(particle) => Some(ContentModel::Particles(vec![particle])),
        };

        let mut effective = match &complex.base {
            None => Effective {
                content: own_content.unwrap_or(ContentModel::Particles(Vec::new())),
                ..Effective::empty()
            },
            Some((base, derivation)) => {
                let base = if depth < MAX_REFERENCE_DEPTH {
                    self.named_type(base, path, depth + 1)
                } else {
                    Effective::empty()
                };
                match derivation {
                    Derivation::Extension => Effective {
                        content: extend(base.content, own_content),
                        ..base
                    },
                    Derivation::Restriction => Effective {
                        content: own_content.unwrap_or(ContentModel::Particles(Vec::new())),
                        attributes: base.attributes,
                        any_attribute: false,
                    },
                }
            }
        };

        for attribute in &complex.attributes {
            effective.attributes.retain(|a| a.name() != attribute.name());
            effective.attributes.push(attribute);
        }
        effective.any_attribute |= complex.any_attribute;
        self.attribute_groups(&complex.attribute_groups, &mut effective, path, depth);
        effective
    }

    fn attribute_groups(
        &mut self,
        groups: &'s [QName],
        effective: &mut Effective<'s>,
        path: &str,
        depth: usize,
    ) {
        if depth >= MAX_REFERENCE_DEPTH {
            return;
        }
        let set = self.set;
        for name in groups {
            let Some(group) = set.attribute_groups.get(name) else {
                self.unresolved("attribute group", name, path);
                effective.any_attribute = true;
                continue;
            };
            effective.attributes.extend(group.attributes.iter());
            effective.any_attribute |= group.any_attribute;
            self.attribute_groups(&group.attribute_groups, effective, path, depth + 1);
        }
    }
}

/// Content of an extension: the base content followed by the new particles.
fn extend<'s>(base: ContentModel<'s>, own: Option<ContentModel<'s>>) -> ContentModel<'s> {
    match (base, own) {
        (base, None) => base,
        (ContentModel::Any, Some(_)) => ContentModel::Any,
        (_, Some(ContentModel::TextOnly)) => ContentModel::TextOnly,
        (ContentModel::Particles(mut base), Some(ContentModel::Particles(own))) => {
            base.extend(own);
            ContentModel::Particles(base)
        }
        (ContentModel::TextOnly, Some(own)) => own,
        (_, Some(ContentModel::Any)) => ContentModel::Any,
    }
}

/// XPath-like paths of an element's children: `Placemark[2]` when the
/// name repeats among the siblings, `Placemark` otherwise.
fn child_paths(element: &Element, parent: &str) -> Vec<String> {
    let mut totals: HashMap<&QName, usize> = HashMap::new();
    for child in element.child_elements() {
        *totals.entry(&child.name).or_default() += 1;
    }

    let mut seen: HashMap<&QName, usize> = HashMap::new();
    element
        .child_elements()
        .map(|child| {
            let position = seen.entry(&child.name).or_default();
            *position += 1;
            if totals[&child.name] > 1 {
                format!("{}/{}[{}]", parent, child.local_name(), position)
            } else {
                format!("{}/{}", parent, child.local_name())
            }
        })
        .collect()
}

fn display_name(name: &QName) -> String {
    match name.namespace() {
        Some(_) => name.to_clark(),
        None => name.local.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Schema, SchemaResolver};

    fn schema(body: &str) -> Schema {
        Schema::parse(
            &format!(
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:k"
  targetNamespace="urn:k" elementFormDefault="qualified">{body}</xs:schema>"#
            ),
            &SchemaResolver::new(),
        )
        .unwrap()
    }

    fn codes(schema: &Schema, document: &str) -> Vec<(&'static str, String)> {
        let doc = kml_xml::parse(document).unwrap();
        schema
            .issues(&doc)
            .into_iter()
            .map(|issue| (issue.code(), issue.path))
            .collect()
    }

    #[test]
    fn test_child_paths() {
        let doc = kml_xml::parse("<a><b/><c/><b/></a>").unwrap();
        assert_eq!(
            child_paths(&doc.root, "/a"),
            ["/a/b[1]", "/a/c", "/a/b[2]"]
        );
    }

    #[test]
    fn test_restriction_replaces_content() {
        let schema = schema(
            r#"
  <xs:complexType name="Base">
    <xs:sequence><xs:element name="a"/><xs:element name="b"/></xs:sequence>
    <xs:attribute name="id"/>
  </xs:complexType>
  <xs:complexType name="Narrow">
    <xs:complexContent>
      <xs:restriction base="Base">
        <xs:sequence><xs:element name="a"/></xs:sequence>
      </xs:restriction>
    </xs:complexContent>
  </xs:complexType>
  <xs:element name="root" type="Narrow"/>"#,
        );

        assert!(codes(&schema, r#"<root xmlns="urn:k" id="1"><a/></root>"#).is_empty());
        assert_eq!(
            codes(&schema, r#"<root xmlns="urn:k"><a/><b/></root>"#),
            [("K-3-3", "/root/b".to_string())]
        );
    }

    #[test]
    fn test_untyped_member_uses_head_type() {
        let schema = schema(
            r#"
  <xs:element name="Head" type="xs:string" abstract="true"/>
  <xs:element name="Member" substitutionGroup="Head"/>
  <xs:element name="root">
    <xs:complexType><xs:sequence><xs:element ref="Head"/></xs:sequence></xs:complexType>
  </xs:element>"#,
        );

        assert!(codes(&schema, r#"<root xmlns="urn:k"><Member>x</Member></root>"#).is_empty());
        assert_eq!(
            codes(&schema, r#"<root xmlns="urn:k"><Member><y/></Member></root>"#),
            [("K-3-4", "/root/Member".to_string())]
        );
    }

    #[test]
    fn test_any_type_content_is_lax() {
        let schema = schema(
            r#"
  <xs:element name="root"/>
  <xs:element name="strict">
    <xs:complexType><xs:attribute name="n" use="required"/></xs:complexType>
  </xs:element>"#,
        );

        assert!(codes(&schema, r#"<root xmlns="urn:k" free="1"><whatever/></root>"#).is_empty());
        assert_eq!(
            codes(&schema, r#"<root xmlns="urn:k"><whatever><strict/></whatever></root>"#),
            [("K-3-5", "/root/whatever/strict".to_string())]
        );
    }
}
