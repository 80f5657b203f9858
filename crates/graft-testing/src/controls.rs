//! Control wrappers over the in-memory toolkit.
//!
//! Each control pairs a constructor that returns a configured
//! [`WidgetNode`] with an update function that takes a props value. The
//! constructors fix the child strategy (leaf, single child, container,
//! slot host); the update functions push props through the diffing and
//! binding machinery exactly the way toolkit wrappers do.
//!
//! Editable controls model their native notification pipeline with
//! [`TestSignal`](crate::signal::TestSignal)s: programmatic writes emit
//! the same signals user edits do, which is precisely the echo problem the
//! binding protocol exists to solve.

use graft_core::{Callback, NodeKind, UpdateScope, WidgetNode};
use graft_foundation::{clamp_selection, clamp_value, Modifier, ModifierExt};

use crate::widget::TestWidget;

/// A text label.
pub fn label(text: &str) -> WidgetNode<TestWidget> {
    let widget = TestWidget::new("label");
    widget.set_prop("text", text);
    WidgetNode::leaf(widget)
}

pub fn update_label(scope: &mut UpdateScope<'_, TestWidget>, text: &str) {
    scope.set(text.to_string(), |widget, text| {
        widget.set_prop("text", text);
    });
}

/// Vertical box. Children are placed with a sibling-relative insert, the
/// only positioned insert most box containers expose.
pub fn column() -> WidgetNode<TestWidget> {
    let widget = TestWidget::new("column");
    let ins = widget.clone();
    let rem = widget.clone();
    WidgetNode::container(
        widget,
        move |child, _index, sibling| ins.insert_child_after(child, sibling),
        move |child| rem.remove_child(child),
    )
}

/// List container with an index-based insert and a native remove-all.
pub fn list_box() -> WidgetNode<TestWidget> {
    let widget = TestWidget::new("list-box");
    let ins = widget.clone();
    let rem = widget.clone();
    let clr = widget.clone();
    WidgetNode::container_with_clear(
        widget,
        move |child, index, _sibling| ins.insert_child_at(child, index),
        move |child| rem.remove_child(child),
        move || clr.remove_all_children(),
    )
}

/// Holds at most one child through a child setter.
pub fn frame() -> WidgetNode<TestWidget> {
    let widget = TestWidget::new("frame");
    let set = widget.clone();
    WidgetNode::single_child(widget, move |child| set.set_slot("child", child))
}

/// Top-level window; its content area holds one child.
pub fn window(title: &str) -> WidgetNode<TestWidget> {
    let widget = TestWidget::new("window");
    widget.set_prop("title", title);
    let set = widget.clone();
    WidgetNode::single_child(widget, move |child| set.set_slot("content", child))
}

/// Title bar whose children are slot routers, not widgets.
pub fn header_bar() -> WidgetNode<TestWidget> {
    WidgetNode::slot_host(TestWidget::new("header-bar"))
}

/// Three-region host; each region holds one widget.
pub fn center_box() -> WidgetNode<TestWidget> {
    WidgetNode::slot_host(TestWidget::new("center-box"))
}

fn pack_slot(slot: &'static str) -> WidgetNode<TestWidget> {
    WidgetNode::virtual_slot(move |anchor: &TestWidget| {
        let add = anchor.clone();
        let rem = anchor.clone();
        NodeKind::append_only(
            move |child| add.add_to_slot(slot, child),
            move |child| rem.remove_from_slot(slot, child),
        )
    })
}

fn single_slot(slot: &'static str) -> WidgetNode<TestWidget> {
    WidgetNode::virtual_slot(move |anchor: &TestWidget| {
        let set = anchor.clone();
        NodeKind::single_child(move |child| set.set_slot(slot, child))
    })
}

/// Routes children into the leading pack area of a header bar.
pub fn pack_start_slot() -> WidgetNode<TestWidget> {
    pack_slot("start")
}

/// Routes children into the trailing pack area of a header bar.
pub fn pack_end_slot() -> WidgetNode<TestWidget> {
    pack_slot("end")
}

/// Routes one child into the title area of a header bar.
pub fn title_slot() -> WidgetNode<TestWidget> {
    single_slot("title")
}

/// One-widget regions of a center box.
pub fn start_widget_slot() -> WidgetNode<TestWidget> {
    single_slot("start-widget")
}

pub fn center_widget_slot() -> WidgetNode<TestWidget> {
    single_slot("center-widget")
}

pub fn end_widget_slot() -> WidgetNode<TestWidget> {
    single_slot("end-widget")
}

#[derive(Clone, Debug, Default)]
pub struct EntryProps {
    pub text: String,
    pub on_change: Option<Callback<String>>,
    pub modifier: Modifier<TestWidget>,
}

/// Editable one-line text field.
pub fn entry() -> WidgetNode<TestWidget> {
    WidgetNode::leaf(TestWidget::new("entry"))
}

/// An entry reports edits through its editing pipeline: an insertion
/// fires `insert-text`, a deletion fires `delete-text`. A programmatic
/// write replaces the whole content and fires both, so the text binding
/// holds a connection on each and blocks them together.
pub fn update_entry(scope: &mut UpdateScope<'_, TestWidget>, props: &EntryProps) {
    scope.set_modifier(&props.modifier);
    scope.bind_value("text", props.text.clone(), |widget, text| {
        widget.set_prop("text", text);
        widget.emit("delete-text", "");
        widget.emit("insert-text", text);
    });
    match &props.on_change {
        Some(on_change) => {
            scope.bind_change("text", on_change.clone(), |widget, change, connections| {
                let report = {
                    let widget = widget.clone();
                    move |_payload: &str| change.emit(widget.prop("text").unwrap_or_default())
                };
                connections.add(widget.signal("delete-text").connect(report.clone()));
                connections.add(widget.signal("insert-text").connect(report));
            });
        }
        None => scope.clear_change("text"),
    }
}

#[derive(Clone, Debug, Default)]
pub struct SwitchProps {
    pub active: bool,
    pub on_toggle: Option<Callback<bool>>,
    pub modifier: Modifier<TestWidget>,
}

pub fn switch() -> WidgetNode<TestWidget> {
    WidgetNode::leaf(TestWidget::new("switch"))
}

pub fn update_switch(scope: &mut UpdateScope<'_, TestWidget>, props: &SwitchProps) {
    scope.set_modifier(&props.modifier);
    scope.bind_value("active", props.active, |widget, active| {
        let value = if *active { "true" } else { "false" };
        widget.set_prop("active", value);
        widget.emit("state-set", value);
    });
    match &props.on_toggle {
        Some(on_toggle) => {
            scope.bind_change("active", on_toggle.clone(), |widget, change, connections| {
                connections.add(
                    widget
                        .signal("state-set")
                        .connect(move |payload| change.emit(payload == "true")),
                );
            });
        }
        None => scope.clear_change("active"),
    }
}

#[derive(Clone, Debug)]
pub struct SpinProps {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub on_value_changed: Option<Callback<f64>>,
    pub modifier: Modifier<TestWidget>,
}

/// Numeric stepper with an adjustable range.
pub fn spin_button() -> WidgetNode<TestWidget> {
    WidgetNode::leaf(TestWidget::new("spin-button"))
}

/// Values outside `[min, max]` are clamped (and logged) before they reach
/// the widget; the widget itself never holds an illegal value.
pub fn update_spin_button(scope: &mut UpdateScope<'_, TestWidget>, props: &SpinProps) {
    scope.set_modifier(&props.modifier);
    scope.set((props.min, props.max), |widget, &(min, max)| {
        widget.set_prop("min", &format!("{min}"));
        widget.set_prop("max", &format!("{max}"));
    });
    let value = clamp_value(props.value, props.min, props.max);
    scope.bind_value("value", value, |widget, value| {
        let formatted = format!("{value}");
        widget.set_prop("value", &formatted);
        widget.emit("value-changed", &formatted);
    });
    match &props.on_value_changed {
        Some(on_value_changed) => {
            scope.bind_change("value", on_value_changed.clone(), |widget, change, connections| {
                connections.add(widget.signal("value-changed").connect(move |payload| {
                    match payload.parse::<f64>() {
                        Ok(value) => change.emit(value),
                        Err(_) => log::warn!("Discarding unparsable spin payload {payload:?}."),
                    }
                }));
            });
        }
        None => scope.clear_change("value"),
    }
}

#[derive(Clone, Debug, Default)]
pub struct ListViewProps {
    pub item_count: usize,
    pub selected: Vec<usize>,
    pub on_select: Option<Callback<Vec<usize>>>,
    pub on_activate: Option<Callback<usize>>,
    pub modifier: Modifier<TestWidget>,
}

/// Virtualized list. Rows come from an item factory, not from tree
/// children, so the node itself is a leaf.
pub fn list_view() -> WidgetNode<TestWidget> {
    WidgetNode::leaf(TestWidget::new("list-view"))
}

pub fn update_list_view(scope: &mut UpdateScope<'_, TestWidget>, props: &ListViewProps) {
    scope.set_modifier(&props.modifier);
    scope.set(props.item_count, |widget, count| {
        widget.set_prop("item-count", &count.to_string());
    });
    // The requested selection and the item count travel together: a count
    // change can move where a stale request clamps to.
    scope.bind_value(
        "selected",
        (props.selected.clone(), props.item_count),
        |widget, (requested, count)| {
            let clamped = clamp_selection(requested, *count);
            let payload = csv(&clamped);
            widget.set_prop("selected", &payload);
            widget.emit("selection-changed", &payload);
        },
    );
    match &props.on_select {
        Some(on_select) => {
            scope.bind_change("selected", on_select.clone(), |widget, change, connections| {
                connections.add(
                    widget
                        .signal("selection-changed")
                        .connect(move |payload| change.emit(parse_csv(payload))),
                );
            });
        }
        None => scope.clear_change("selected"),
    }
    match &props.on_activate {
        Some(on_activate) => {
            scope.bind_change("activate", on_activate.clone(), |widget, change, connections| {
                connections.add(widget.signal("row-activated").connect(move |payload| {
                    match payload.parse::<usize>() {
                        Ok(position) => change.emit(position),
                        Err(_) => log::warn!("Discarding unparsable row activation {payload:?}."),
                    }
                }));
            });
        }
        None => scope.clear_change("activate"),
    }
}

fn csv(positions: &[usize]) -> String {
    positions
        .iter()
        .map(|position| position.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_csv(payload: &str) -> Vec<usize> {
    payload
        .split(',')
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// Simulates the user typing: widget state changes first, then the insert
/// side of the editing pipeline fires once.
pub fn user_types(widget: &TestWidget, text: &str) {
    widget.set_prop("text", text);
    widget.emit("insert-text", text);
}

/// Simulates the user deleting the entry content.
pub fn user_clears(widget: &TestWidget) {
    widget.set_prop("text", "");
    widget.emit("delete-text", "");
}

pub fn user_toggles(widget: &TestWidget, active: bool) {
    let value = if active { "true" } else { "false" };
    widget.set_prop("active", value);
    widget.emit("state-set", value);
}

pub fn user_spins(widget: &TestWidget, value: f64) {
    let formatted = format!("{value}");
    widget.set_prop("value", &formatted);
    widget.emit("value-changed", &formatted);
}

pub fn user_selects(widget: &TestWidget, positions: &[usize]) {
    let payload = csv(positions);
    widget.set_prop("selected", &payload);
    widget.emit("selection-changed", &payload);
}

pub fn user_activates(widget: &TestWidget, position: usize) {
    widget.emit("row-activated", &position.to_string());
}
