//! Reading schema documents into a [`SchemaSet`].

use crate::error::{LoadResult, SchemaLoadError};
use crate::model::{
    AttributeGroup, AttributeUse, ComplexType, Content, Derivation, ElementDecl,
    NamespaceConstraint, Particle, ProcessContents, SchemaSet, TypeDef, TypeRef, Wildcard,
    XSD_NAMESPACE,
};
use crate::resolver::SchemaResolver;
use kml_xml::{Document, Element, NamespaceDeclaration, QName, XML_NAMESPACE};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Loads a schema and everything it imports or includes.
pub(crate) struct Loader<'r> {
    resolver: &'r SchemaResolver,
    set: SchemaSet,
    loaded: HashSet<PathBuf>,
    pending: Vec<PendingFile>,
}

struct PendingFile {
    location: String,
    relative_to: Option<PathBuf>,
    /// Target namespace adopted by an included schema that declares none
    inherited_namespace: Option<String>,
}

/// Per-file settings from the `xs:schema` element.
struct SchemaFile<'p> {
    path: Option<&'p Path>,
    target_namespace: Option<String>,
    elements_qualified: bool,
    attributes_qualified: bool,
}

/// In-scope namespace bindings, innermost element first.
struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    declarations: &'a [NamespaceDeclaration],
}

impl<'a> Scope<'a> {
    fn root(element: &'a Element) -> Self {
        Scope {
            parent: None,
            declarations: &element.namespace_declarations,
        }
    }

    fn child<'b>(&'b self, element: &'b Element) -> Scope<'b> {
        Scope {
            parent: Some(self),
            declarations: &element.namespace_declarations,
        }
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&'a str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(decl) = current
                .declarations
                .iter()
                .rev()
                .find(|decl| decl.prefix.as_deref() == prefix)
            {
                return Some(decl.uri.as_str());
            }
            scope = current.parent;
        }
        None
    }
}

fn is_xs(element: &Element, local: &str) -> bool {
    element.namespace() == Some(XSD_NAMESPACE) && element.local_name() == local
}

fn xs_children(element: &Element) -> impl Iterator<Item = &Element> {
    element
        .child_elements()
        .filter(|child| child.namespace() == Some(XSD_NAMESPACE))
}

fn is_true(value: Option<&str>) -> bool {
    matches!(value, Some("true" | "1"))
}

impl<'r> Loader<'r> {
    pub(crate) fn new(resolver: &'r SchemaResolver) -> Self {
        Self {
            resolver,
            set: SchemaSet::default(),
            loaded: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Load the schema at `path` and its imports.
    pub(crate) fn load_file(mut self, path: &Path) -> LoadResult<SchemaSet> {
        self.load_one(path, None)?;
        self.drain();
        Ok(self.set)
    }

    /// Load a schema given as text. Imports resolve against the working
    /// directory and the search paths.
    pub(crate) fn load_text(mut self, content: &str) -> LoadResult<SchemaSet> {
        let doc = kml_xml::parse(content)
            .map_err(|error| SchemaLoadError::Parse { path: None, error })?;
        self.process(&doc, None, None)?;
        self.drain();
        Ok(self.set)
    }

    fn drain(&mut self) {
        while let Some(pending) = self.pending.pop() {
            let path = match self
                .resolver
                .resolve(&pending.location, pending.relative_to.as_deref())
            {
                Ok(path) => path,
                Err(error) => {
                    warn!(location = %pending.location, %error, "skipping unresolved schema import");
                    continue;
                }
            };
            if let Err(error) = self.load_one(&path, pending.inherited_namespace) {
                warn!(path = %path.display(), %error, "skipping schema import");
            }
        }
    }

    fn load_one(&mut self, path: &Path, inherited_namespace: Option<String>) -> LoadResult<()> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.loaded.insert(key) {
            debug!(path = %path.display(), "schema already loaded");
            return Ok(());
        }

        debug!(path = %path.display(), "loading schema");
        let content = fs::read_to_string(path).map_err(|source| SchemaLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = kml_xml::parse(&content).map_err(|error| SchemaLoadError::Parse {
            path: Some(path.to_path_buf()),
            error,
        })?;
        self.process(&doc, Some(path), inherited_namespace)
    }

    fn process(
        &mut self,
        doc: &Document,
        path: Option<&Path>,
        inherited_namespace: Option<String>,
    ) -> LoadResult<()> {
        let root = &doc.root;
        if !is_xs(root, "schema") {
            return Err(SchemaLoadError::NotASchema {
                path: path.map(Path::to_path_buf),
                found: root.name.to_string(),
            });
        }

        let file = SchemaFile {
            path,
            target_namespace: root
                .get_attribute("targetNamespace")
                .filter(|ns| !ns.is_empty())
                .map(str::to_string)
                .or(inherited_namespace),
            elements_qualified: root.get_attribute("elementFormDefault") == Some("qualified"),
            attributes_qualified: root.get_attribute("attributeFormDefault")
                == Some("qualified"),
        };
        let scope = Scope::root(root);
        let directory = path.and_then(Path::parent).map(Path::to_path_buf);

        for child in xs_children(root) {
            let scope = scope.child(child);
            match child.local_name() {
                "import" | "include" => {
                    let Some(location) = child.get_attribute("schemaLocation") else {
                        debug!(
                            namespace = child.get_attribute("namespace"),
                            "import without schemaLocation"
                        );
                        continue;
                    };
                    let inherited_namespace = if child.local_name() == "include" {
                        file.target_namespace.clone()
                    } else {
                        None
                    };
                    self.pending.push(PendingFile {
                        location: location.to_string(),
                        relative_to: directory.clone(),
                        inherited_namespace,
                    });
                }
                "element" => {
                    let decl = self.element_decl(&file, &scope, child, true)?;
                    self.set.add_element(decl);
                }
                "complexType" => {
                    let name = self.global_name(&file, child)?;
                    let complex = self.complex_type(&file, &scope, child)?;
                    self.set.types.insert(name, TypeDef::Complex(complex));
                }
                "simpleType" => {
                    let name = self.global_name(&file, child)?;
                    self.set.types.insert(name, TypeDef::Simple);
                }
                "group" => {
                    let name = self.global_name(&file, child)?;
                    let mut particles = Vec::new();
                    for particle in xs_children(child) {
                        if let Some(particle) = self.particle(&file, &scope, particle)? {
                            particles.push(particle);
                        }
                    }
                    self.set.groups.insert(name, Particle::Compositor(particles));
                }
                "attributeGroup" => {
                    let name = self.global_name(&file, child)?;
                    let mut group = AttributeGroup::default();
                    for item in xs_children(child) {
                        let item_scope = scope.child(item);
                        match item.local_name() {
                            "attribute" => {
                                if let Some(attribute) = self.attribute_use(&file, &item_scope, item)? {
                                    group.attributes.push(attribute);
                                }
                            }
                            "attributeGroup" => {
                                group
                                    .attribute_groups
                                    .push(self.reference(&file, &item_scope, item, "ref")?);
                            }
                            "anyAttribute" => group.any_attribute = true,
                            _ => {}
                        }
                    }
                    self.set.attribute_groups.insert(name, group);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn invalid(&self, file: &SchemaFile, reference: &str, message: impl Into<String>) -> SchemaLoadError {
        SchemaLoadError::InvalidReference {
            path: file.path.map(Path::to_path_buf),
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    fn global_name(&self, file: &SchemaFile, element: &Element) -> LoadResult<QName> {
        match element.get_attribute("name") {
            Some(name) => Ok(QName::new(file.target_namespace.as_deref(), name)),
            None => Err(self.invalid(
                file,
                element.local_name(),
                "global component without a name",
            )),
        }
    }

    /// Resolve a QName-valued attribute against the in-scope prefixes.
    fn reference(
        &self,
        file: &SchemaFile,
        scope: &Scope,
        element: &Element,
        attribute: &str,
    ) -> LoadResult<QName> {
        let value = element
            .get_attribute(attribute)
            .ok_or_else(|| self.invalid(file, attribute, format!("`{}` has no `{}`", element.local_name(), attribute)))?
            .trim();
        let (prefix, local) = match value.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, value),
        };
        if local.is_empty() {
            return Err(self.invalid(file, value, "empty local name"));
        }
        match (prefix, scope.lookup(prefix)) {
            (_, Some(namespace)) => Ok(QName::new(Some(namespace), local)),
            (None, None) => Ok(QName::local(local)),
            (Some(prefix), None) => Err(self.invalid(
                file,
                value,
                format!("prefix `{}` is not bound to a namespace", prefix),
            )),
        }
    }

    fn element_decl(
        &self,
        file: &SchemaFile,
        scope: &Scope,
        element: &Element,
        global: bool,
    ) -> LoadResult<ElementDecl> {
        let Some(local) = element.get_attribute("name") else {
            return Err(self.invalid(file, "element", "element without a name or ref"));
        };
        let qualified = global
            || match element.get_attribute("form") {
                Some(form) => form == "qualified",
                None => file.elements_qualified,
            };
        let namespace = if qualified {
            file.target_namespace.as_deref()
        } else {
            None
        };

        let type_ref = if element.get_attribute("type").is_some() {
            TypeRef::Named(self.reference(file, scope, element, "type")?)
        } else if let Some(anonymous) = xs_children(element).find(|c| is_xs(c, "complexType")) {
            let complex = self.complex_type(file, &scope.child(anonymous), anonymous)?;
            TypeRef::Anonymous(Box::new(TypeDef::Complex(complex)))
        } else if xs_children(element).any(|c| is_xs(c, "simpleType")) {
            TypeRef::Anonymous(Box::new(TypeDef::Simple))
        } else {
            TypeRef::Unspecified
        };

        let substitution_group = if element.get_attribute("substitutionGroup").is_some() {
            Some(self.reference(file, scope, element, "substitutionGroup")?)
        } else {
            None
        };

        Ok(ElementDecl {
            name: QName::new(namespace, local),
            type_ref,
            substitution_group,
            is_abstract: is_true(element.get_attribute("abstract")),
        })
    }

    fn complex_type(
        &self,
        file: &SchemaFile,
        scope: &Scope,
        element: &Element,
    ) -> LoadResult<ComplexType> {
        let mut complex = ComplexType::empty();
        for child in xs_children(element) {
            let child_scope = scope.child(child);
            match child.local_name() {
                "complexContent" | "simpleContent" => {
                    for derivation in xs_children(child) {
                        let kind = match derivation.local_name() {
                            "extension" => Derivation::Extension,
                            "restriction" => Derivation::Restriction,
                            _ => continue,
                        };
                        let derivation_scope = child_scope.child(derivation);
                        let base = self.reference(file, &derivation_scope, derivation, "base")?;
                        complex.base = Some((base, kind));
                        self.type_body(file, &derivation_scope, derivation, &mut complex)?;
                    }
                    if child.local_name() == "simpleContent" {
                        complex.content = Content::Simple;
                    }
                }
                _ => self.type_body_item(file, &child_scope, child, &mut complex)?,
            }
        }
        Ok(complex)
    }

    fn type_body(
        &self,
        file: &SchemaFile,
        scope: &Scope,
        element: &Element,
        complex: &mut ComplexType,
    ) -> LoadResult<()> {
        for child in xs_children(element) {
            self.type_body_item(file, &scope.child(child), child, complex)?;
        }
        Ok(())
    }

    /// One particle or attribute child of a type body.
    fn type_body_item(
        &self,
        file: &SchemaFile,
        scope: &Scope,
        child: &Element,
        complex: &mut ComplexType,
    ) -> LoadResult<()> {
        match child.local_name() {
            "attribute" => {
                if let Some(attribute) = self.attribute_use(file, scope, child)? {
                    complex.attributes.push(attribute);
                }
            }
            "attributeGroup" => {
                complex
                    .attribute_groups
                    .push(self.reference(file, scope, child, "ref")?);
            }
            "anyAttribute" => complex.any_attribute = true,
            _ => {
                if let Some(particle) = self.particle(file, scope, child)? {
                    complex.content = Content::Particle(particle);
                }
            }
        }
        Ok(())
    }

    fn particle(
        &self,
        file: &SchemaFile,
        scope: &Scope,
        element: &Element,
    ) -> LoadResult<Option<Particle>> {
        let particle = match element.local_name() {
            "element" => {
                if element.get_attribute("ref").is_some() {
                    Particle::ElementRef(self.reference(file, scope, element, "ref")?)
                } else {
                    Particle::Element(self.element_decl(file, scope, element, false)?)
                }
            }
            "sequence" | "choice" | "all" => {
                let mut particles = Vec::new();
                for child in xs_children(element) {
                    if let Some(particle) = self.particle(file, &scope.child(child), child)? {
                        particles.push(particle);
                    }
                }
                Particle::Compositor(particles)
            }
            "group" => Particle::GroupRef(self.reference(file, scope, element, "ref")?),
            "any" => Particle::Any(Wildcard {
                namespaces: namespace_constraint(
                    element.get_attribute("namespace").unwrap_or("##any"),
                    file.target_namespace.as_deref(),
                ),
                process: match element.get_attribute("processContents") {
                    Some("lax") => ProcessContents::Lax,
                    Some("skip") => ProcessContents::Skip,
                    _ => ProcessContents::Strict,
                },
            }),
            _ => return Ok(None),
        };
        Ok(Some(particle))
    }

    fn attribute_use(
        &self,
        file: &SchemaFile,
        scope: &Scope,
        element: &Element,
    ) -> LoadResult<Option<AttributeUse>> {
        let required = match element.get_attribute("use") {
            Some("prohibited") => return Ok(None),
            Some("required") => true,
            _ => false,
        };
        if element.get_attribute("ref").is_some() {
            let name = self.reference(file, scope, element, "ref")?;
            return Ok(Some(AttributeUse::Ref { name, required }));
        }
        let Some(local) = element.get_attribute("name") else {
            return Err(self.invalid(file, "attribute", "attribute without a name or ref"));
        };
        let qualified = match element.get_attribute("form") {
            Some(form) => form == "qualified",
            None => file.attributes_qualified,
        };
        let namespace = if qualified {
            file.target_namespace.as_deref()
        } else {
            None
        };
        Ok(Some(AttributeUse::Local {
            name: QName::new(namespace, local),
            required,
        }))
    }
}

fn namespace_constraint(value: &str, target: Option<&str>) -> NamespaceConstraint {
    match value.trim() {
        "##any" => NamespaceConstraint::Any,
        "##other" => NamespaceConstraint::Other(target.map(str::to_string)),
        list => NamespaceConstraint::List(
            list.split_whitespace()
                .map(|token| match token {
                    "##local" => None,
                    "##targetNamespace" => target.map(str::to_string),
                    uri => Some(uri.to_string()),
                })
                .collect(),
        ),
    }
}
