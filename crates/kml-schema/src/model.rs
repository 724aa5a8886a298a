//! The XML Schema components the validator understands.
//!
//! Everything is keyed by qualified name. Particles keep their nesting
//! (sequence/choice/all) but the validator only asks which elements a
//! content model admits, so compositors are not distinguished.

use kml_xml::QName;
use std::collections::HashMap;

/// Namespace of XML Schema itself.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespace of the XML Schema instance attributes (`xsi:schemaLocation`).
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Reference from an element declaration to its type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// `type="..."`
    Named(QName),
    /// An anonymous `complexType` or `simpleType` child
    Anonymous(Box<TypeDef>),
    /// No type given: the substitution group head's type, else `xs:anyType`
    Unspecified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub name: QName,
    pub type_ref: TypeRef,
    pub substitution_group: Option<QName>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// Any `simpleType`; content is text only
    Simple,
    Complex(ComplexType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    Extension,
    Restriction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// No particle and no simple content
    Empty,
    Particle(Particle),
    /// `simpleContent`; text only
    Simple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    /// Base type and how this type derives from it
    pub base: Option<(QName, Derivation)>,
    pub content: Content,
    pub attributes: Vec<AttributeUse>,
    pub attribute_groups: Vec<QName>,
    pub any_attribute: bool,
}

impl ComplexType {
    pub fn empty() -> Self {
        Self {
            base: None,
            content: Content::Empty,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
            any_attribute: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    /// Local element declaration
    Element(ElementDecl),
    /// `<element ref="..."/>`
    ElementRef(QName),
    /// `sequence`, `choice` or `all`
    Compositor(Vec<Particle>),
    /// `<group ref="..."/>`
    GroupRef(QName),
    Any(Wildcard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wildcard {
    pub namespaces: NamespaceConstraint,
    pub process: ProcessContents,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceConstraint {
    /// `##any`
    Any,
    /// `##other`: any namespace except the target namespace and no namespace
    Other(Option<String>),
    /// Explicit list; `None` stands for `##local`
    List(Vec<Option<String>>),
}

impl NamespaceConstraint {
    pub fn allows(&self, namespace: Option<&str>) -> bool {
        match self {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Other(target) => {
                namespace.is_some() && namespace != target.as_deref()
            }
            NamespaceConstraint::List(list) => list.iter().any(|ns| ns.as_deref() == namespace),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeUse {
    /// Local declaration
    Local { name: QName, required: bool },
    /// `<attribute ref="..."/>`
    Ref { name: QName, required: bool },
}

impl AttributeUse {
    pub fn name(&self) -> &QName {
        match self {
            AttributeUse::Local { name, .. } | AttributeUse::Ref { name, .. } => name,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            AttributeUse::Local { required, .. } | AttributeUse::Ref { required, .. } => *required,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeGroup {
    pub attributes: Vec<AttributeUse>,
    pub attribute_groups: Vec<QName>,
    pub any_attribute: bool,
}

/// All global components from a schema and the files it imports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    pub elements: HashMap<QName, ElementDecl>,
    pub types: HashMap<QName, TypeDef>,
    pub groups: HashMap<QName, Particle>,
    pub attribute_groups: HashMap<QName, AttributeGroup>,
    /// Substitution group head to its direct members
    pub substitutions: HashMap<QName, Vec<QName>>,
}

impl SchemaSet {
    pub fn add_element(&mut self, decl: ElementDecl) {
        if let Some(head) = &decl.substitution_group {
            self.substitutions
                .entry(head.clone())
                .or_default()
                .push(decl.name.clone());
        }
        self.elements.insert(decl.name.clone(), decl);
    }

    /// Whether `member` may substitute for `head`, directly or transitively.
    pub fn substitutes_for(&self, member: &QName, head: &QName) -> bool {
        let mut pending = vec![head];
        let mut seen: Vec<&QName> = Vec::new();
        while let Some(current) = pending.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(members) = self.substitutions.get(current) {
                if members.contains(member) {
                    return true;
                }
                pending.extend(members);
            }
        }
        false
    }
}

/// Whether `name` is a builtin type (`xs:string`, `xs:anyType`, ...).
pub fn is_builtin(name: &QName) -> bool {
    name.namespace() == Some(XSD_NAMESPACE)
}

pub fn is_any_type(name: &QName) -> bool {
    is_builtin(name) && name.local == "anyType"
}
