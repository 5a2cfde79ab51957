//! Decides whether a component needs client-side hydration and which
//! client directive fits it best.

use crate::ir::{Component, ElementNode};
use crate::options::ClientDirective;
use crate::visitor::{walk_element, NodeVisitor};
use std::fmt;

/// Event bindings that only work once the element is hydrated.
pub const INTERACTIVE_EVENTS: &[&str] = &[
    "onClick",
    "onDblClick",
    "onInput",
    "onChange",
    "onSubmit",
    "onKeyDown",
    "onKeyUp",
    "onKeyPress",
    "onFocus",
    "onBlur",
    "onMouseDown",
    "onMouseUp",
    "onMouseEnter",
    "onMouseLeave",
    "onMouseOver",
    "onPointerDown",
    "onPointerUp",
    "onTouchStart",
    "onTouchEnd",
    "onScroll",
    "onWheel",
    "onDrag",
    "onDrop",
];

pub fn is_interactive_event(name: &str) -> bool {
    INTERACTIVE_EVENTS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationReason {
    Refs(usize),
    MountHooks(usize),
    UpdateHooks(usize),
    InteractiveEvent { event: String, node: String },
}

impl HydrationReason {
    pub fn is_mount(&self) -> bool {
        matches!(self, HydrationReason::MountHooks(_))
    }
}

impl fmt::Display for HydrationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationReason::Refs(n) => write!(f, "uses {} ref(s)", n),
            HydrationReason::MountHooks(n) => write!(f, "has {} onMount hook(s)", n),
            HydrationReason::UpdateHooks(n) => write!(f, "has {} onUpdate hook(s)", n),
            HydrationReason::InteractiveEvent { event, node } => {
                write!(f, "has interactive event {} on <{}>", event, node)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationAnalysis {
    pub needs_hydration: bool,
    pub reasons: Vec<HydrationReason>,
    pub suggested_directive: ClientDirective,
}

pub fn analyze_hydration(component: &Component) -> HydrationAnalysis {
    let mut reasons = Vec::new();

    let refs = collect_refs(component);
    if !refs.is_empty() {
        reasons.push(HydrationReason::Refs(refs.len()));
    }
    if !component.hooks.on_mount.is_empty() {
        reasons.push(HydrationReason::MountHooks(component.hooks.on_mount.len()));
    }
    if let Some(updates) = &component.hooks.on_update {
        reasons.push(HydrationReason::UpdateHooks(updates.len()));
    }

    let mut finder = EventFinder::default();
    finder.visit_component(component);
    let has_events = !finder.hits.is_empty();
    reasons.extend(finder.hits);

    // Refs need the element right away; events alone can wait for idle.
    // Mount code always runs eagerly.
    let mut suggested_directive = ClientDirective::Load;
    if has_events && refs.is_empty() {
        suggested_directive = ClientDirective::Idle;
    }
    if reasons.iter().any(HydrationReason::is_mount) {
        suggested_directive = ClientDirective::Load;
    }

    HydrationAnalysis {
        needs_hydration: !reasons.is_empty(),
        reasons,
        suggested_directive,
    }
}

/// Unique ref binding codes in document order.
pub fn collect_refs(component: &Component) -> Vec<String> {
    let mut collector = RefCollector::default();
    collector.visit_component(component);
    collector.refs
}

#[derive(Default)]
struct RefCollector {
    refs: Vec<String>,
}

impl NodeVisitor for RefCollector {
    fn visit_element(&mut self, element: &ElementNode) {
        if let Some(binding) = element.bindings.get("ref") {
            let name = binding.code.trim();
            if !name.is_empty() && !self.refs.iter().any(|r| r == name) {
                self.refs.push(name.to_string());
            }
        }
        walk_element(self, element);
    }
}

/// Records the first interactive event of an element and prunes its subtree;
/// siblings and other branches are still visited.
#[derive(Default)]
struct EventFinder {
    hits: Vec<HydrationReason>,
}

impl NodeVisitor for EventFinder {
    fn visit_element(&mut self, element: &ElementNode) {
        let hit = element
            .bindings
            .keys()
            .find(|name| is_interactive_event(name));
        match hit {
            Some(event) => self.hits.push(HydrationReason::InteractiveEvent {
                event: event.clone(),
                node: element.name.clone(),
            }),
            None => walk_element(self, element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Binding, ForNode, HookCode, Node, ShowNode, UpdateHook};
    use pretty_assertions::assert_eq;

    fn element(name: &str) -> ElementNode {
        ElementNode::new(name)
    }

    fn component(children: Vec<Node>) -> Component {
        Component {
            children,
            ..Component::default()
        }
    }

    #[test]
    fn test_static_component_needs_nothing() {
        let c = component(vec![Node::Element(
            element("div")
                .with_property("title", "x")
                .with_binding("onCustom", Binding::new("go()"))
                .with_children(vec![Node::dynamic_text("state.a")]),
        )]);
        let analysis = analyze_hydration(&c);
        assert!(!analysis.needs_hydration);
        assert!(analysis.reasons.is_empty());
        assert_eq!(analysis.suggested_directive, ClientDirective::Load);
    }

    #[test]
    fn test_events_alone_suggest_idle() {
        let c = component(vec![Node::Element(
            element("button").with_binding("onClick", Binding::new("state.n++")),
        )]);
        let analysis = analyze_hydration(&c);
        assert!(analysis.needs_hydration);
        assert_eq!(analysis.suggested_directive, ClientDirective::Idle);
        assert_eq!(
            analysis.reasons[0].to_string(),
            "has interactive event onClick on <button>"
        );
    }

    #[test]
    fn test_refs_keep_load() {
        let c = component(vec![
            Node::Element(element("input").with_binding("ref", Binding::new("inputRef"))),
            Node::Element(element("button").with_binding("onClick", Binding::new("go()"))),
        ]);
        let analysis = analyze_hydration(&c);
        assert_eq!(analysis.suggested_directive, ClientDirective::Load);
        assert_eq!(analysis.reasons[0], HydrationReason::Refs(1));
        assert_eq!(analysis.reasons[0].to_string(), "uses 1 ref(s)");
    }

    #[test]
    fn test_mount_hook_overrides_idle() {
        let mut c = component(vec![Node::Element(
            element("button").with_binding("onClick", Binding::new("go()")),
        )]);
        c.hooks.on_mount.push(HookCode {
            code: "console.log('ready')".to_string(),
        });
        let analysis = analyze_hydration(&c);
        assert_eq!(analysis.suggested_directive, ClientDirective::Load);
        assert_eq!(
            analysis.reasons,
            vec![
                HydrationReason::MountHooks(1),
                HydrationReason::InteractiveEvent {
                    event: "onClick".to_string(),
                    node: "button".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_declared_empty_update_list_counts() {
        let mut c = component(vec![]);
        c.hooks.on_update = Some(Vec::<UpdateHook>::new());
        let analysis = analyze_hydration(&c);
        assert!(analysis.needs_hydration);
        assert_eq!(analysis.reasons, vec![HydrationReason::UpdateHooks(0)]);
    }

    #[test]
    fn test_event_walk_prunes_hit_branch_but_visits_siblings() {
        let c = component(vec![
            Node::Element(
                element("form")
                    .with_binding("onSubmit", Binding::new("save()"))
                    .with_children(vec![Node::Element(
                        element("button").with_binding("onClick", Binding::new("x()")),
                    )]),
            ),
            Node::For(ForNode {
                each: Binding::new("items"),
                item: "item".to_string(),
                index: None,
                children: vec![Node::Show(ShowNode {
                    when: Binding::new("item.open"),
                    children: vec![],
                    else_branch: Some(Box::new(Node::Element(
                        element("a").with_binding("onFocus", Binding::new("y()")),
                    ))),
                })],
            }),
        ]);
        let events: Vec<String> = analyze_hydration(&c)
            .reasons
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            events,
            vec![
                "has interactive event onSubmit on <form>",
                "has interactive event onFocus on <a>",
            ]
        );
    }

    #[test]
    fn test_collect_refs_dedupes() {
        let c = component(vec![
            Node::Element(element("input").with_binding("ref", Binding::new("a"))),
            Node::Element(element("input").with_binding("ref", Binding::new("a"))),
            Node::Element(element("canvas").with_binding("ref", Binding::new("b"))),
        ]);
        assert_eq!(collect_refs(&c), vec!["a", "b"]);
    }
}
