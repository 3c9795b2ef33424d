//! Document tree model.
//!
//! A document is a tree of elements with text leaves. Elements carry a kind
//! and a small set of attributes; text leaves are plain strings. Bibliography
//! placeholders are elements of kind [`ElementKind::Bibliography`].

/// Index path from the document root to a node.
pub type NodePath = Vec<usize>;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An atomic run of plain text.
    Text(String),
    /// A typed element with attributes and children.
    Element(Element),
}

impl Node {
    /// Creates a text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Returns the concatenated text of this node and all its descendants.
    pub fn astext(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(element) => element.astext(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// The kind of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Document,
    Section,
    Paragraph,
    Inline,
    Emphasis,
    Strong,
    /// Hyperlink; the target is stored in [`Attributes::refuri`].
    Reference,
    Citation,
    Label,
    /// Placeholder marking where a bibliography must be rendered.
    Bibliography,
}

/// Element attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub ids: Vec<String>,
    pub names: Vec<String>,
    pub classes: Vec<String>,
    pub refuri: Option<String>,
}

/// A typed element with ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes and no children.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: Attributes::default(),
            children: Vec::new(),
        }
    }

    /// Appends `id` to the element's ids. The first id is its identity.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.attributes.ids.push(id.into());
        self
    }

    /// Appends `name` to the element's names.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.attributes.names.push(name.into());
        self
    }

    /// Sets the hyperlink target.
    pub fn with_refuri(mut self, refuri: impl Into<String>) -> Self {
        self.attributes.refuri = Some(refuri.into());
        self
    }

    /// Appends a child and returns the element, for building trees inline.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Returns the element's identity token, its first id.
    pub fn id(&self) -> Option<&str> {
        self.attributes.ids.first().map(String::as_str)
    }

    pub fn astext(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Returns all descendant elements of the given kind, in document order.
    pub fn descendants_of_kind(&self, kind: ElementKind) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_of_kind(kind, &mut found);
        found
    }

    fn collect_of_kind<'a>(&'a self, kind: ElementKind, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if let Node::Element(element) = child {
                if element.kind == kind {
                    out.push(element);
                }
                element.collect_of_kind(kind, out);
            }
        }
    }

    fn contains_id(&self, id: &str) -> bool {
        self.attributes.ids.iter().any(|other| other == id)
            || self.children.iter().any(|child| match child {
                Node::Element(element) => element.contains_id(id),
                Node::Text(_) => false,
            })
    }
}

/// A document: a root element of kind [`ElementKind::Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
    source: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            root: Element::new(ElementKind::Document),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.root.push(child);
    }

    pub fn astext(&self) -> String {
        self.root.astext()
    }

    /// Returns the paths of all elements of `kind`, in document order.
    ///
    /// The result is a snapshot: callers may replace the nodes it points to
    /// one for one without invalidating the remaining paths. Matches nested
    /// inside a match are not reported.
    pub fn find_paths(&self, kind: ElementKind) -> Vec<NodePath> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        collect_paths(&self.root, kind, &mut prefix, &mut paths);
        paths
    }

    /// Returns the node at `path`, if any.
    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        let (&last, parents) = path.split_last()?;
        let mut element = &self.root;
        for &index in parents {
            element = element.children.get(index)?.as_element()?;
        }
        element.children.get(last)
    }

    /// Replaces the node at `path` and returns the node it displaced.
    ///
    /// Returns `None` and leaves the tree untouched when the path does not
    /// resolve.
    pub fn replace(&mut self, path: &[usize], node: Node) -> Option<Node> {
        let (&last, parents) = path.split_last()?;
        let mut element = &mut self.root;
        for &index in parents {
            element = match element.children.get_mut(index)? {
                Node::Element(child) => child,
                Node::Text(_) => return None,
            };
        }
        let slot = element.children.get_mut(last)?;
        Some(std::mem::replace(slot, node))
    }

    /// Returns true if any element in the document carries `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.root.contains_id(id)
    }

    /// Derives an id from `name` that is not yet used in this document.
    ///
    /// # Arguments
    ///
    /// * `name` - Free-form name, e.g. an entry key
    ///
    /// # Returns
    ///
    /// A lowercase id that no element of the document carries yet.
    ///
    /// The name is lowercased, runs of non-alphanumeric characters become a
    /// single `-`, and leading characters up to the first letter are dropped.
    /// A numeric suffix is appended when the id is already taken.
    pub fn make_id(&self, name: &str) -> String {
        let base = normalize_id(name);
        if !self.root.contains_id(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.root.contains_id(candidate))
            .unwrap_or(base)
    }
}

fn collect_paths(
    element: &Element,
    kind: ElementKind,
    prefix: &mut Vec<usize>,
    out: &mut Vec<NodePath>,
) {
    for (index, child) in element.children.iter().enumerate() {
        if let Node::Element(child) = child {
            prefix.push(index);
            if child.kind == kind {
                out.push(prefix.clone());
            } else {
                collect_paths(child, kind, prefix, out);
            }
            prefix.pop();
        }
    }
}

fn normalize_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            id.push(c);
        } else if !id.is_empty() && !id.ends_with('-') {
            id.push('-');
        }
    }
    while id.ends_with('-') {
        id.pop();
    }
    let start = id
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(id.len());
    id.drain(..start);
    if id.is_empty() {
        "id".to_string()
    } else {
        id
    }
}
