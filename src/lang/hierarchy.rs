//! Class hierarchy queries.
use std::collections::{HashMap, HashSet};

use petgraph::visit::{Control, DfsEvent, depth_first_search};

use super::{Class, references::ClassRef};

/// The inheritance structure of the loaded classes.
///
/// Answers the declared-relationship queries class-hierarchy analysis needs:
/// superclass, direct subclasses, direct subinterfaces, and direct
/// implementors. Transitive subclass cones are computed on demand.
#[derive(Debug, Default)]
pub struct ClassHierarchy {
    pub(crate) super_classes: HashMap<ClassRef, ClassRef>,
    pub(crate) subclasses: HashMap<ClassRef, HashSet<ClassRef>>,
    subinterfaces: HashMap<ClassRef, HashSet<ClassRef>>,
    implementors: HashMap<ClassRef, HashSet<ClassRef>>,
    interfaces: HashSet<ClassRef>,
}

impl ClassHierarchy {
    /// Creates a new [`ClassHierarchy`] from a list of classes.
    #[must_use]
    pub fn from_classes<'a, I>(classes: I) -> Self
    where
        I: IntoIterator<Item = &'a Class>,
    {
        let mut hierarchy = Self::default();
        for class in classes {
            let class_ref = class.make_ref();
            if class.is_interface() {
                hierarchy.interfaces.insert(class_ref.clone());
            }
            if let Some(super_class) = class.super_class.as_ref() {
                hierarchy
                    .subclasses
                    .entry(super_class.clone())
                    .or_default()
                    .insert(class_ref.clone());
                hierarchy
                    .super_classes
                    .insert(class_ref.clone(), super_class.clone());
            }
            for interface in &class.interfaces {
                let relation = if class.is_interface() {
                    &mut hierarchy.subinterfaces
                } else {
                    &mut hierarchy.implementors
                };
                relation
                    .entry(interface.clone())
                    .or_default()
                    .insert(class_ref.clone());
            }
        }
        hierarchy
    }

    /// Returns the superclass of the given class.
    #[must_use]
    pub fn super_class(&self, class: &ClassRef) -> Option<&ClassRef> {
        self.super_classes.get(class)
    }

    /// Checks whether the given reference denotes a loaded interface.
    #[must_use]
    pub fn is_interface(&self, class: &ClassRef) -> bool {
        self.interfaces.contains(class)
    }

    /// Returns the direct subclasses of the given class.
    #[must_use]
    pub fn direct_subclasses(&self, class: &ClassRef) -> HashSet<ClassRef> {
        self.subclasses.get(class).cloned().unwrap_or_default()
    }

    /// Returns the direct subinterfaces of the given interface.
    #[must_use]
    pub fn direct_subinterfaces(&self, interface: &ClassRef) -> HashSet<ClassRef> {
        self.subinterfaces.get(interface).cloned().unwrap_or_default()
    }

    /// Returns the classes directly implementing the given interface.
    #[must_use]
    pub fn direct_implementors(&self, interface: &ClassRef) -> HashSet<ClassRef> {
        self.implementors.get(interface).cloned().unwrap_or_default()
    }

    /// Returns the set of transitive subclasses of the given class.
    #[must_use]
    pub fn subclasses(&self, class: &ClassRef) -> HashSet<ClassRef> {
        let mut subclasses = HashSet::new();
        depth_first_search(self, [class], |event| {
            if let DfsEvent::TreeEdge(_, i) = event {
                subclasses.insert(i);
            }
            if let DfsEvent::BackEdge(_, _) = event {
                return Control::<()>::Prune;
            }
            Control::<()>::Continue
        });
        subclasses.remove(class);
        subclasses.into_iter().cloned().collect()
    }
}
