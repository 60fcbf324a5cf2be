//! Component descriptors - the static, author-supplied half of a component.

use std::fmt;
use std::rc::Rc;

use super::context::{RenderContext, SetupContext};
use crate::reactive::ReadonlyRecord;
use crate::types::Record;
use crate::vnode::VNodeRef;

/// Produces a component's subtree from its render context.
pub type RenderFn = Rc<dyn Fn(&RenderContext) -> VNodeRef>;

/// Lifecycle hook bound to the render context.
pub type Hook = Rc<dyn Fn(&RenderContext)>;

/// Factory for a component's local state.
pub type DataFn = Rc<dyn Fn() -> Record>;

/// Hook that runs before any instance state exists.
pub type BeforeCreateFn = Rc<dyn Fn()>;

/// Initialization function receiving readonly props and the setup context.
pub type SetupFn = Rc<dyn Fn(&ReadonlyRecord, &SetupContext<'_>) -> SetupResult>;

/// What `setup` hands back.
#[derive(Clone, Default)]
pub enum SetupResult {
    /// Nothing to add; the descriptor's `render` is used.
    #[default]
    Empty,
    /// Use this render function instead of the descriptor's.
    Render(RenderFn),
    /// Extra names exposed through the render context (lowest precedence).
    Bindings(Record),
}

impl SetupResult {
    pub fn render(f: impl Fn(&RenderContext) -> VNodeRef + 'static) -> Self {
        SetupResult::Render(Rc::new(f))
    }

    pub fn bindings(bindings: Record) -> Self {
        SetupResult::Bindings(bindings)
    }
}

/// Static description of a component.
///
/// ```
/// use std::rc::Rc;
/// use spark_vdom::{Component, h, record};
///
/// let counter = Rc::new(
///     Component::named("Counter")
///         .with_props(["step"])
///         .with_data(|| record! { "count" => 0 })
///         .with_render(|ctx| h("span").text(ctx.read_text("count")).build()),
/// );
/// assert_eq!(counter.props, vec!["step".to_string()]);
/// ```
#[derive(Clone, Default)]
pub struct Component {
    pub name: String,
    /// Declared prop names; other caller-supplied keys become attrs.
    pub props: Vec<String>,
    pub data: Option<DataFn>,
    pub render: Option<RenderFn>,
    pub setup: Option<SetupFn>,
    pub before_create: Option<BeforeCreateFn>,
    pub created: Option<Hook>,
    pub before_mount: Option<Hook>,
    pub mounted: Option<Hook>,
    pub before_update: Option<Hook>,
    pub updated: Option<Hook>,
}

impl Component {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props = props.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, data: impl Fn() -> Record + 'static) -> Self {
        self.data = Some(Rc::new(data));
        self
    }

    pub fn with_render(mut self, render: impl Fn(&RenderContext) -> VNodeRef + 'static) -> Self {
        self.render = Some(Rc::new(render));
        self
    }

    pub fn with_setup(
        mut self,
        setup: impl Fn(&ReadonlyRecord, &SetupContext<'_>) -> SetupResult + 'static,
    ) -> Self {
        self.setup = Some(Rc::new(setup));
        self
    }

    pub fn on_before_create(mut self, hook: impl Fn() + 'static) -> Self {
        self.before_create = Some(Rc::new(hook));
        self
    }

    pub fn on_created(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.created = Some(Rc::new(hook));
        self
    }

    pub fn on_before_mount(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.before_mount = Some(Rc::new(hook));
        self
    }

    pub fn on_mounted(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.mounted = Some(Rc::new(hook));
        self
    }

    pub fn on_before_update(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.before_update = Some(Rc::new(hook));
        self
    }

    pub fn on_updated(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.updated = Some(Rc::new(hook));
        self
    }

    /// Whether `key` is a declared prop.
    pub fn declares(&self, key: &str) -> bool {
        self.props.iter().any(|p| p == key)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("has_render", &self.render.is_some())
            .field("has_setup", &self.setup.is_some())
            .finish()
    }
}
