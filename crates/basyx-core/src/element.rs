//! Submodel element trees.
//!
//! Elements form a tree of leaves (properties) and containers (collections,
//! lists, entities). A container either owns its children or defers them to a
//! [`ChildLoader`] that is only invoked when the tree is walked through it.

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A leaf element carrying a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Locally unique short identifier
    pub id_short: String,
    /// XSD value type (e.g., "xs:double")
    pub value_type: Option<String>,
    /// Current value
    pub value: Option<Value>,
}

/// Supplies the children of a deferred container on demand.
pub trait ChildLoader: Send + Sync {
    /// Fetch the children.
    ///
    /// # Errors
    ///
    /// Returns error if the backing store cannot provide the children.
    fn load(&self) -> Result<Vec<ElementNode>, LoadError>;
}

impl<F> ChildLoader for F
where
    F: Fn() -> Result<Vec<ElementNode>, LoadError> + Send + Sync,
{
    fn load(&self) -> Result<Vec<ElementNode>, LoadError> {
        self()
    }
}

/// Children of a container.
#[derive(Clone)]
pub enum Children {
    /// Already materialized
    Loaded(Vec<ElementNode>),
    /// Fetched through the loader when first needed
    Deferred(Arc<dyn ChildLoader>),
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Children::Loaded(children) => f.debug_tuple("Loaded").field(children).finish(),
            Children::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A named element holding child elements.
#[derive(Debug, Clone)]
pub struct Container {
    /// Locally unique short identifier
    pub id_short: String,
    /// Child elements
    pub children: Children,
}

impl Container {
    /// Container with eagerly loaded children.
    #[must_use]
    pub fn loaded(id_short: impl Into<String>, children: Vec<ElementNode>) -> Self {
        Self {
            id_short: id_short.into(),
            children: Children::Loaded(children),
        }
    }

    /// Container whose children are produced by `fetch`.
    #[must_use]
    pub fn deferred<F>(id_short: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Result<Vec<ElementNode>, LoadError> + Send + Sync + 'static,
    {
        Self::with_loader(id_short, Arc::new(fetch))
    }

    /// Container whose children come from a shared loader.
    #[must_use]
    pub fn with_loader(id_short: impl Into<String>, loader: Arc<dyn ChildLoader>) -> Self {
        Self {
            id_short: id_short.into(),
            children: Children::Deferred(loader),
        }
    }

    /// Whether the children still have to be fetched.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self.children, Children::Deferred(_))
    }
}

/// Materializes the children of a tree node.
pub trait Expandable {
    /// Children of this node, fetching deferred ones.
    ///
    /// # Errors
    ///
    /// Returns error if a deferred loader fails.
    fn expand(&self) -> Result<Cow<'_, [ElementNode]>, LoadError>;
}

impl Expandable for Container {
    fn expand(&self) -> Result<Cow<'_, [ElementNode]>, LoadError> {
        match &self.children {
            Children::Loaded(children) => Ok(Cow::Borrowed(children.as_slice())),
            Children::Deferred(loader) => {
                tracing::debug!(id_short = %self.id_short, "Materializing deferred children");
                Ok(Cow::Owned(loader.load()?))
            }
        }
    }
}

/// A node of a submodel element tree.
#[derive(Debug, Clone)]
pub enum ElementNode {
    /// Leaf value element
    Property(Property),
    /// Children addressed by idShort
    Collection(Container),
    /// Children addressed by position
    List(Container),
    /// Entity with child statements
    Entity(Container),
}

impl ElementNode {
    /// Leaf property with a value.
    #[must_use]
    pub fn property(id_short: impl Into<String>, value: impl Into<Value>) -> Self {
        ElementNode::Property(Property {
            id_short: id_short.into(),
            value_type: None,
            value: Some(value.into()),
        })
    }

    /// Collection with eager children.
    #[must_use]
    pub fn collection(id_short: impl Into<String>, children: Vec<ElementNode>) -> Self {
        ElementNode::Collection(Container::loaded(id_short, children))
    }

    /// List with eager children.
    #[must_use]
    pub fn list(id_short: impl Into<String>, children: Vec<ElementNode>) -> Self {
        ElementNode::List(Container::loaded(id_short, children))
    }

    /// Entity with eager statements.
    #[must_use]
    pub fn entity(id_short: impl Into<String>, statements: Vec<ElementNode>) -> Self {
        ElementNode::Entity(Container::loaded(id_short, statements))
    }

    /// Short identifier of this node.
    #[must_use]
    pub fn id_short(&self) -> &str {
        match self {
            ElementNode::Property(p) => &p.id_short,
            ElementNode::Collection(c) | ElementNode::List(c) | ElementNode::Entity(c) => {
                &c.id_short
            }
        }
    }

    /// AAS `modelType` name of this node.
    #[must_use]
    pub fn model_type(&self) -> &'static str {
        match self {
            ElementNode::Property(_) => "Property",
            ElementNode::Collection(_) => "SubmodelElementCollection",
            ElementNode::List(_) => "SubmodelElementList",
            ElementNode::Entity(_) => "Entity",
        }
    }

    /// Container view of this node, `None` for leaves.
    #[must_use]
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            ElementNode::Property(_) => None,
            ElementNode::Collection(c) | ElementNode::List(c) | ElementNode::Entity(c) => Some(c),
        }
    }

    /// Build a tree from AAS JSON.
    ///
    /// Accepts a `Submodel` (children under `submodelElements`), collections
    /// and lists (children under `value`) and entities (children under
    /// `statements`). Any other model type becomes a property.
    ///
    /// # Errors
    ///
    /// Returns error if an element is not a JSON object or a child array has
    /// the wrong shape.
    pub fn from_json(value: &Value) -> Result<Self, LoadError> {
        let obj = value
            .as_object()
            .ok_or_else(|| LoadError(format!("element is not an object: {value}")))?;

        let id_short = obj
            .get("idShort")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let model_type = obj.get("modelType").and_then(Value::as_str).unwrap_or("");

        let node = match model_type {
            "Submodel" | "SubmodelElementCollection" => ElementNode::Collection(
                Container::loaded(id_short, children_from_json(obj, child_field(model_type))?),
            ),
            "SubmodelElementList" => {
                ElementNode::List(Container::loaded(id_short, children_from_json(obj, "value")?))
            }
            "Entity" => ElementNode::Entity(Container::loaded(
                id_short,
                children_from_json(obj, "statements")?,
            )),
            _ => ElementNode::Property(Property {
                id_short,
                value_type: obj
                    .get("valueType")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                value: obj.get("value").cloned(),
            }),
        };

        Ok(node)
    }

    /// Value-only JSON rendering, fetching deferred children.
    ///
    /// # Errors
    ///
    /// Returns error if a deferred loader fails.
    pub fn to_value_json(&self) -> Result<Value, LoadError> {
        match self {
            ElementNode::Property(p) => Ok(p.value.clone().unwrap_or(Value::Null)),
            ElementNode::List(c) => c
                .expand()?
                .iter()
                .map(ElementNode::to_value_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ElementNode::Collection(c) | ElementNode::Entity(c) => {
                let mut map = Map::new();
                for child in c.expand()?.iter() {
                    map.insert(child.id_short().to_string(), child.to_value_json()?);
                }
                Ok(Value::Object(map))
            }
        }
    }
}

impl Expandable for ElementNode {
    fn expand(&self) -> Result<Cow<'_, [ElementNode]>, LoadError> {
        match self.as_container() {
            Some(container) => container.expand(),
            None => Ok(Cow::Borrowed(&[])),
        }
    }
}

fn child_field(model_type: &str) -> &'static str {
    if model_type == "Submodel" {
        "submodelElements"
    } else {
        "value"
    }
}

fn children_from_json(obj: &Map<String, Value>, field: &str) -> Result<Vec<ElementNode>, LoadError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(ElementNode::from_json).collect(),
        Some(other) => Err(LoadError(format!("`{field}` is not an array: {other}"))),
    }
}

/// Failure to produce the children of an element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("element load failed: {0}")]
pub struct LoadError(pub String);
