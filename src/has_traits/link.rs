//! Keeping traits on different objects in sync.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::trait_types::TraitError;
use crate::value::Value;

use super::events::{EventFilter, EventType, Observer};
use super::{HasTraits, WeakHasTraits};

/// Maps a value on its way across a link.
pub type Transform = Rc<dyn Fn(&Value) -> Result<Value, TraitError>>;

/// Set while a link is pushing a value, so the echo does not bounce back.
struct Busy<'a>(&'a Cell<bool>);

impl<'a> Busy<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn check_end(obj: &HasTraits, name: &str) -> Result<(), TraitError> {
    if obj.has_trait(name) {
        Ok(())
    } else {
        Err(TraitError::unknown_trait(obj.class().name(), name))
    }
}

fn label(obj: &HasTraits, name: &str) -> String {
    format!("{}.{name}", obj.class().name())
}

fn identity() -> Transform {
    Rc::new(|value: &Value| Ok(value.clone()))
}

/// Pushes every change of `from.name` through `transform` into
/// `to.to_name`. With `verify`, the source must still hold the changed
/// value afterwards, or the link is reported broken.
fn forwarder(
    busy: &Rc<Cell<bool>>,
    (from, from_name): (&HasTraits, &str),
    (to, to_name): (&HasTraits, &str),
    transform: Transform,
    verify: bool,
) -> Observer {
    let busy = Rc::clone(busy);
    let source: WeakHasTraits = from.downgrade();
    let target: WeakHasTraits = to.downgrade();
    let source_name = from_name.to_owned();
    let target_name = to_name.to_owned();
    Observer::new(move |change| {
        let Some(_busy) = Busy::enter(&busy) else {
            return Ok(());
        };
        let (Some(source), Some(target)) = (source.upgrade(), target.upgrade()) else {
            return Ok(());
        };
        target.set(&target_name, transform(&change.new)?)?;
        if verify && source.get(&source_name)? != change.new {
            return Err(TraitError::BrokenLink {
                source_end: label(&source, &source_name),
                target_end: label(&target, &target_name),
            });
        }
        Ok(())
    })
}

/// An active link. Dropping it keeps the link alive; call
/// [`Link::unlink`] to stop it.
pub struct Link {
    source: (WeakHasTraits, String),
    target: (WeakHasTraits, String),
    forward: Observer,
    backward: Option<Observer>,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("source", &self.source.1)
            .field("target", &self.target.1)
            .field("bidirectional", &self.backward.is_some())
            .finish_non_exhaustive()
    }
}

impl Link {
    /// Stops synchronizing. Ends whose objects are gone are skipped.
    ///
    /// # Errors
    ///
    /// Fails when an observer was already removed by other means.
    pub fn unlink(self) -> Result<(), TraitError> {
        if let Some(source) = self.source.0.upgrade() {
            source.unobserve(&self.forward, self.source.1.as_str(), EventType::Change)?;
        }
        if let (Some(target), Some(backward)) = (self.target.0.upgrade(), &self.backward) {
            target.unobserve(backward, self.target.1.as_str(), EventType::Change)?;
        }
        Ok(())
    }
}

/// Links two traits both ways. The target takes the source's value first.
///
/// # Errors
///
/// Fails when either name is not a trait, or when the initial copy is
/// rejected. Nothing is linked then.
pub fn link(source: (&HasTraits, &str), target: (&HasTraits, &str)) -> Result<Link, TraitError> {
    link_with(source, target, identity(), identity())
}

/// Links two traits both ways through a transform and its inverse.
///
/// # Errors
///
/// Same as [`link`].
pub fn link_with(
    source: (&HasTraits, &str),
    target: (&HasTraits, &str),
    forward: Transform,
    backward: Transform,
) -> Result<Link, TraitError> {
    check_end(source.0, source.1)?;
    check_end(target.0, target.1)?;
    let value = forward(&source.0.get(source.1)?)?;
    target.0.set(target.1, value)?;
    let busy = Rc::new(Cell::new(false));
    let to_target = forwarder(&busy, source, target, forward, true);
    let to_source = forwarder(&busy, target, source, backward, true);
    source
        .0
        .add_observer(&to_target, source.1, EventFilter::Only(EventType::Change));
    target
        .0
        .add_observer(&to_source, target.1, EventFilter::Only(EventType::Change));
    Ok(Link {
        source: (source.0.downgrade(), source.1.to_owned()),
        target: (target.0.downgrade(), target.1.to_owned()),
        forward: to_target,
        backward: Some(to_source),
    })
}

/// Links `source` to `target` one way, optionally through `transform`.
/// Changes to the target are not propagated back.
///
/// # Errors
///
/// Fails when either name is not a trait, or when the initial copy is
/// rejected.
pub fn directional_link(
    source: (&HasTraits, &str),
    target: (&HasTraits, &str),
    transform: Option<Transform>,
) -> Result<Link, TraitError> {
    check_end(source.0, source.1)?;
    check_end(target.0, target.1)?;
    let transform = transform.unwrap_or_else(identity);
    let value = transform(&source.0.get(source.1)?)?;
    target.0.set(target.1, value)?;
    let busy = Rc::new(Cell::new(false));
    let to_target = forwarder(&busy, source, target, transform, false);
    source
        .0
        .add_observer(&to_target, source.1, EventFilter::Only(EventType::Change));
    Ok(Link {
        source: (source.0.downgrade(), source.1.to_owned()),
        target: (target.0.downgrade(), target.1.to_owned()),
        forward: to_target,
        backward: None,
    })
}
