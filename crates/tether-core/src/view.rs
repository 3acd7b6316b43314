#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewKind {
    /// Renders nothing.
    Empty,
    Text(String),
    Group,
}

/// Output of a component: a tree of views.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub kind: ViewKind,
    pub children: Vec<View>,
}

impl Default for View {
    fn default() -> Self {
        Self::empty()
    }
}

impl View {
    pub fn new(kind: ViewKind) -> Self {
        View {
            kind,
            children: vec![],
        }
    }

    pub fn empty() -> Self {
        View::new(ViewKind::Empty)
    }

    pub fn text(text: impl Into<String>) -> Self {
        View::new(ViewKind::Text(text.into()))
    }

    pub fn group(children: Vec<View>) -> Self {
        View::new(ViewKind::Group).with_children(children)
    }

    pub fn with_children(mut self, kids: Vec<View>) -> Self {
        self.children = kids;
        self
    }

    /// True if this view and all its descendants render nothing.
    pub fn is_empty(&self) -> bool {
        match self.kind {
            ViewKind::Empty => true,
            ViewKind::Text(_) => false,
            ViewKind::Group => self.children.iter().all(View::is_empty),
        }
    }

    /// Text nodes in depth-first order.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let ViewKind::Text(t) = &self.kind {
            out.push(t);
        }
        for child in &self.children {
            child.collect_texts(out);
        }
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::text(text)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::text(text)
    }
}

impl From<Vec<View>> for View {
    fn from(children: Vec<View>) -> Self {
        View::group(children)
    }
}
