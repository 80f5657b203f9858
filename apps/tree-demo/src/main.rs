use std::cell::RefCell;
use std::rc::Rc;

use graft_core::{Applier, Callback, NodeError};
use graft_foundation::{ItemFactory, Modifier};
use graft_testing::prelude::*;

fn main() -> Result<(), NodeError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    println!("=== Graft tree demo ===");
    println!("A scripted session against the in-memory toolkit:");
    println!("  - structural edits keep native child order in sync");
    println!("  - programmatic writes never echo into callbacks");
    println!("  - a declined user edit is written back exactly once");
    println!("  - stale selections clamp (watch for the warning)");
    println!();

    // The model an embedding app would hold.
    let draft = Rc::new(RefCell::new("type here".to_string()));
    let selected = Rc::new(RefCell::new(vec![0usize]));

    let mut applier = Applier::new(window("Graft demo"));
    applier.insert(0, column())?;
    applier.down(0)?;

    applier.insert(0, header_bar())?;
    applier.down(0)?;
    applier.insert(0, pack_start_slot())?;
    applier.down(0)?;
    applier.insert(0, label("back"))?;
    applier.up()?;
    applier.insert(1, title_slot())?;
    applier.down(1)?;
    applier.insert(0, label("Inbox"))?;
    applier.up()?;
    applier.up()?;

    applier.insert(1, entry())?;
    applier.insert(2, list_view())?;
    applier.reset();

    let on_change = {
        let draft = Rc::clone(&draft);
        Callback::new(move |text: String| {
            log::info!("Draft edited by the user: {text:?}");
            *draft.borrow_mut() = text;
        })
    };
    let on_select = {
        let selected = Rc::clone(&selected);
        Callback::new(move |positions: Vec<usize>| {
            log::info!("Selection changed by the user: {positions:?}");
            *selected.borrow_mut() = positions;
        })
    };

    let pass = |applier: &mut Applier<TestWidget>, item_count: usize| -> Result<(), NodeError> {
        applier.reset();
        applier.down(0)?;
        applier.down(1)?;
        let props = EntryProps {
            text: draft.borrow().clone(),
            on_change: Some(on_change.clone()),
            modifier: Modifier::empty(),
        };
        applier.update_current(|scope| update_entry(scope, &props))?;
        applier.up()?;
        applier.down(2)?;
        let list_props = ListViewProps {
            item_count,
            selected: selected.borrow().clone(),
            on_select: Some(on_select.clone()),
            ..ListViewProps::default()
        };
        applier.update_current(|scope| update_list_view(scope, &list_props))?;
        applier.reset();
        Ok(())
    };

    pass(&mut applier, 4)?;
    print_frame("after the first pass", &applier);

    // The user types; the model accepts, and the next pass settles.
    if let Some(field) = applier.node_at(&[0, 1]).and_then(|node| node.widget()) {
        user_types(field, "hello graft");
    }
    pass(&mut applier, 4)?;
    print_frame("after a user edit", &applier);

    // Structural churn: a status row appears, moves to the top, leaves.
    applier.down(0)?;
    applier.insert(3, label("sending..."))?;
    applier.move_child(3, 0)?;
    print_frame("while the status row is up", &applier);
    applier.remove(0)?;
    applier.reset();

    // The list shrinks under a stale selection; the clamp logs a warning
    // and the widget never holds an illegal position.
    *selected.borrow_mut() = vec![3];
    pass(&mut applier, 2)?;
    print_frame("after the list shrank under a stale selection", &applier);

    // A pooled row rebinding across items, the way a virtualized list
    // drives its row pool.
    let factory: ItemFactory<TestWidget, String> =
        ItemFactory::new(|content, item: &String| content.insert_child(0, label(item)));
    let mut row = factory.create_row(list_box());
    row.bind("message 0".to_string())?;
    row.bind("message 3".to_string())?;
    println!("--- a pooled row after two binds ---");
    if let Some(widget) = row.content().widget() {
        print!("{}", widget.render_tree());
    }
    println!();

    Ok(())
}

fn print_frame(caption: &str, applier: &Applier<TestWidget>) {
    println!("--- {caption} ---");
    if let Some(widget) = applier.root().widget() {
        print!("{}", widget.render_tree());
    }
    println!();
}
