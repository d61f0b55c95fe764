use libadwaita as adw;
use adw::prelude::*;
use adw::Application;
use glib::{self, ControlFlow};
use gtk4 as gtk;
use rxalert_core::{
    logging, AlertChannel, Capabilities, Config, DrugSearch, DrugSearchItem, Error,
    FallbackAlerts, InAppAlerts, JsonFileStore, LowSupply, Prescription, RxTermsClient,
    SearchResult, SearchSequencer, Tracker,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

const NOTIFICATION_ID: &str = "rxalert-low-supply";
const TRAY_LOG_FILE: &str = "rxalert_tray.log";
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

struct UiState {
    tracker: Tracker,
    client: RxTermsClient,
    in_app: InAppAlerts,
    results: Vec<DrugSearchItem>,
    default_quantity: u32,
}

#[derive(Clone)]
struct Widgets {
    search: gtk::SearchEntry,
    inventory: gtk::Box,
    results: gtk::Box,
    banner: gtk::Label,
    quantity: gtk::SpinButton,
    instructions: gtk::Entry,
}

#[derive(Debug)]
enum TrayEvent {
    Activate,
    Quit,
    WatcherOnline,
    WatcherOffline,
}

struct RxAlertTray {
    tx: Sender<TrayEvent>,
}

impl RxAlertTray {
    fn send(&self, event: TrayEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Tray event dropped; main loop has exited");
        }
    }
}

impl ksni::Tray for RxAlertTray {
    fn id(&self) -> String {
        "rxalert-tray".into()
    }

    fn title(&self) -> String {
        "RxAlert".into()
    }

    fn icon_name(&self) -> String {
        // Hosts that ignore pixmaps still draw a themed icon.
        "emblem-important".into()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![pill_icon(22), pill_icon(44)]
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: "RxAlert".into(),
            description: "Track doses and refills".into(),
            ..Default::default()
        }
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        self.send(TrayEvent::Activate);
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        use ksni::menu::StandardItem;
        vec![
            StandardItem {
                label: "Open Prescriptions".into(),
                activate: Box::new(|this: &mut Self| this.send(TrayEvent::Activate)),
                ..Default::default()
            }
            .into(),
            ksni::MenuItem::Separator,
            StandardItem {
                label: "Quit".into(),
                icon_name: "application-exit".into(),
                activate: Box::new(|this: &mut Self| this.send(TrayEvent::Quit)),
                ..Default::default()
            }
            .into(),
        ]
    }

    fn watcher_online(&self) {
        self.send(TrayEvent::WatcherOnline);
    }

    fn watcher_offine(&self) -> bool {
        self.send(TrayEvent::WatcherOffline);
        true
    }
}

/// A horizontal two-tone capsule on a transparent background, ARGB32.
fn pill_icon(size: i32) -> ksni::Icon {
    const LEFT: u32 = 0xFFE74C3C;
    const RIGHT: u32 = 0xFFF5F5F5;
    let radius = size as f32 / 4.0;
    let (top, bottom) = (size as f32 / 4.0, size as f32 * 3.0 / 4.0);
    let (left_cap, right_cap) = (radius, size as f32 - radius);
    let cy = size as f32 / 2.0;

    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let cx = px.clamp(left_cap, right_cap);
            let inside = py >= top
                && py <= bottom
                && (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius;
            let argb = match inside {
                false => 0,
                true if x < size / 2 => LEFT,
                true => RIGHT,
            };
            data.extend_from_slice(&argb.to_be_bytes());
        }
    }
    ksni::Icon {
        width: size,
        height: size,
        data,
    }
}

/// Desktop notification through the GApplication
struct DesktopNotifier {
    app: glib::WeakRef<Application>,
}

impl AlertChannel for DesktopNotifier {
    fn notify(&mut self, alert: &LowSupply) -> rxalert_core::Result<()> {
        let app = self
            .app
            .upgrade()
            .filter(|app| app.is_registered())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "application is not registered with the session bus",
                ))
            })?;

        let notification = gio::Notification::new(LowSupply::TITLE);
        notification.set_body(Some(&alert.message()));
        notification.set_priority(gio::NotificationPriority::High);
        app.send_notification(Some(NOTIFICATION_ID), &notification);
        Ok(())
    }
}

/// One inventory session per application.
///
/// Every window reads and writes the same `Tracker`, so the in-memory
/// inventory and the file never diverge. A failed open is not cached; the
/// next activation tries again.
struct Session<T> {
    slot: RefCell<Option<Rc<RefCell<T>>>>,
}

impl<T> Session<T> {
    fn new() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }

    fn get_or_open<E>(
        &self,
        open: impl FnOnce() -> Result<T, E>,
    ) -> Result<Rc<RefCell<T>>, E> {
        if let Some(state) = self.slot.borrow().as_ref() {
            return Ok(state.clone());
        }
        let state = Rc::new(RefCell::new(open()?));
        *self.slot.borrow_mut() = Some(state.clone());
        Ok(state)
    }
}

struct TrayApp {
    session: Session<UiState>,
    window: RefCell<Option<glib::WeakRef<adw::ApplicationWindow>>>,
}

/// Runs only the last of a burst of calls, `delay` after it was made.
struct Debouncer {
    delay: Duration,
    pending: Rc<RefCell<Option<glib::SourceId>>>,
}

impl Debouncer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    fn call(&self, f: impl FnOnce() + 'static) {
        if let Some(source) = self.pending.borrow_mut().take() {
            source.remove();
        }
        let pending = self.pending.clone();
        let source = glib::timeout_add_local_once(self.delay, move || {
            // Fired sources are already gone from the main context.
            pending.borrow_mut().take();
            f();
        });
        *self.pending.borrow_mut() = Some(source);
    }
}

fn main() {
    let data_dir = Config::load().unwrap_or_default().data.data_dir;
    logging::init_file(&data_dir.join(TRAY_LOG_FILE));

    let app = Application::builder()
        .application_id("com.rxalert.tray")
        .build();

    app.connect_activate(setup_tray);

    app.run();
}

fn setup_tray(app: &Application) {
    // Closing the window must not quit; the tray icon stays.
    std::mem::forget(app.hold());

    let shell = Rc::new(TrayApp {
        session: Session::new(),
        window: RefCell::new(None),
    });

    let (tx, rx) = channel::<TrayEvent>();
    let _svc = ksni::TrayService::new(RxAlertTray { tx }).spawn();
    tracing::info!("Tray icon registered");

    let app_weak = app.downgrade();
    let mut watcher_seen = false;
    let mut warned_no_watcher = false;
    {
        let shell = shell.clone();
        glib::timeout_add_local(Duration::from_millis(300), move || {
            for event in rx.try_iter() {
                match event {
                    TrayEvent::Activate => {
                        if let Some(app) = app_weak.upgrade() {
                            show_tracker_window(&app, &shell);
                        }
                    }
                    TrayEvent::Quit => {
                        if let Some(app) = app_weak.upgrade() {
                            tracing::info!("Quit requested from tray menu");
                            app.quit();
                        }
                    }
                    TrayEvent::WatcherOnline => {
                        watcher_seen = true;
                        warned_no_watcher = false;
                        tracing::info!("Tray host available");
                    }
                    TrayEvent::WatcherOffline => {
                        watcher_seen = false;
                        tracing::info!("Tray host went away");
                    }
                }
            }

            if !watcher_seen && !warned_no_watcher {
                warned_no_watcher = true;
                tracing::warn!("No tray host found; use the window that opens at startup");
            }
            ControlFlow::Continue
        });
    }

    show_tracker_window(app, &shell);
}

fn open_session(app: &Application) -> rxalert_core::Result<UiState> {
    let config = Config::load()?;
    let client = RxTermsClient::new(&config.search)?;
    let in_app = InAppAlerts::new();

    let alerts = FallbackAlerts::new(
        DesktopNotifier {
            app: app.downgrade(),
        },
        in_app.clone(),
    );

    let tracker = Tracker::open(Capabilities {
        search: Box::new(client.clone()),
        store: Box::new(JsonFileStore::new(config.data.inventory_path())),
        alerts: Box::new(alerts),
    })?;

    Ok(UiState {
        tracker,
        client,
        in_app,
        results: Vec::new(),
        default_quantity: config.inventory.default_quantity,
    })
}

/// Present the tracker window, building it on first use or after it was closed.
fn show_tracker_window(app: &Application, shell: &TrayApp) {
    let existing = shell.window.borrow().as_ref().and_then(|w| w.upgrade());
    if let Some(window) = existing {
        window.present();
        return;
    }

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .default_width(480)
        .default_height(720)
        .title("RxAlert")
        .build();

    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);
    window.set_content(Some(&content));
    *shell.window.borrow_mut() = Some(window.downgrade());

    let state = match shell.session.get_or_open(|| open_session(app)) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("Failed to load prescriptions: {}", err);
            let label = gtk::Label::new(Some(&format!(
                "⚠ Could not load your prescriptions:\n{}",
                err
            )));
            label.set_wrap(true);
            content.append(&label);
            window.present();
            return;
        }
    };

    let default_quantity = state.borrow().default_quantity;
    let widgets = build_layout(&content, default_quantity);

    // Pick up anything the CLI changed while the window was closed.
    let reloaded = state.borrow_mut().tracker.reload().map(|_| ());
    if let Err(err) = reloaded {
        report_failure(&widgets, "reload prescriptions", &err);
    }

    connect_search(&window, &widgets, state.clone());
    rebuild_inventory(&state, &widgets);

    window.present();
}

fn build_layout(content: &gtk::Box, default_quantity: u32) -> Widgets {
    let banner = gtk::Label::new(None);
    banner.set_wrap(true);
    banner.set_visible(false);
    banner.add_css_class("warning");
    content.append(&banner);

    let form_title = gtk::Label::new(Some("Add Prescription"));
    form_title.add_css_class("title-4");
    form_title.set_xalign(0.0);
    content.append(&form_title);

    let search = gtk::SearchEntry::new();
    search.set_property(
        "placeholder-text",
        "Search brand or generic (e.g., amoxicillin or Lipitor)",
    );
    content.append(&search);

    let instructions = gtk::Entry::new();
    instructions.set_placeholder_text(Some("Instructions (e.g., 1 tab PO BID)"));
    content.append(&instructions);

    let quantity_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
    quantity_row.append(&gtk::Label::new(Some("Quantity")));
    let quantity = gtk::SpinButton::with_range(1.0, 1000.0, 1.0);
    quantity.set_value(f64::from(default_quantity));
    quantity_row.append(&quantity);
    content.append(&quantity_row);

    let results = gtk::Box::new(gtk::Orientation::Vertical, 4);
    let results_scroll = gtk::ScrolledWindow::new();
    results_scroll.set_min_content_height(160);
    results_scroll.set_child(Some(&results));
    content.append(&results_scroll);

    content.append(&gtk::Separator::new(gtk::Orientation::Horizontal));

    let list_title = gtk::Label::new(Some("Your Prescriptions"));
    list_title.add_css_class("title-4");
    list_title.set_xalign(0.0);
    content.append(&list_title);

    let inventory = gtk::Box::new(gtk::Orientation::Vertical, 8);
    let inventory_scroll = gtk::ScrolledWindow::new();
    inventory_scroll.set_vexpand(true);
    inventory_scroll.set_child(Some(&inventory));
    content.append(&inventory_scroll);

    Widgets {
        search,
        inventory,
        results,
        banner,
        quantity,
        instructions,
    }
}

/// Run searches off the main thread once typing pauses; only the newest
/// search's result is shown.
fn connect_search(
    window: &adw::ApplicationWindow,
    widgets: &Widgets,
    state: Rc<RefCell<UiState>>,
) {
    let sequencer = Arc::new(SearchSequencer::new());
    let (tx, rx): (Sender<(u64, SearchResult)>, Receiver<(u64, SearchResult)>) = channel();
    let client = state.borrow().client.clone();
    let debouncer = Debouncer::new(SEARCH_DEBOUNCE);

    {
        let sequencer = sequencer.clone();
        widgets.search.connect_search_changed(move |entry| {
            let term = entry.text().trim().to_string();
            let sequencer = sequencer.clone();
            let tx = tx.clone();
            let client = client.clone();
            debouncer.call(move || {
                let ticket = sequencer.begin();
                std::thread::spawn(move || {
                    let result = client.search(&term).unwrap_or_else(|e| {
                        tracing::warn!("Drug search for {:?} failed: {}", term, e);
                        SearchResult::empty()
                    });
                    let _ = tx.send((ticket, result));
                });
            });
        });
    }

    let window_weak = window.downgrade();
    let widgets = widgets.clone();
    glib::timeout_add_local(Duration::from_millis(100), move || {
        if window_weak.upgrade().is_none() {
            return ControlFlow::Break;
        }
        while let Ok((ticket, result)) = rx.try_recv() {
            if !sequencer.is_current(ticket) {
                tracing::debug!("Discarding stale search result {}", ticket);
                continue;
            }
            state.borrow_mut().results = result.items;
            rebuild_results(&state, &widgets);
        }
        ControlFlow::Continue
    });
}

fn clear(container: &gtk::Box) {
    while let Some(child) = container.first_child() {
        container.remove(&child);
    }
}

fn show_banner(widgets: &Widgets, text: &str) {
    widgets.banner.set_text(text);
    widgets.banner.set_visible(!text.is_empty());
}

fn rebuild_results(state: &Rc<RefCell<UiState>>, widgets: &Widgets) {
    clear(&widgets.results);

    let items = state.borrow().results.clone();
    for item in items {
        let name = gtk::Label::new(Some(&item.display_name));
        name.set_xalign(0.0);
        name.add_css_class("heading");
        widgets.results.append(&name);

        let strengths = gtk::FlowBox::new();
        strengths.set_selection_mode(gtk::SelectionMode::None);
        for (index, strength) in item.strengths.iter().enumerate() {
            let button = gtk::Button::with_label(strength.trim());
            let state = state.clone();
            let widgets_for_click = widgets.clone();
            let item = item.clone();
            button.connect_clicked(move |_| {
                add_selection(&state, &widgets_for_click, &item, index);
            });
            strengths.insert(&button, -1);
        }
        widgets.results.append(&strengths);
    }
}

fn add_selection(
    state: &Rc<RefCell<UiState>>,
    widgets: &Widgets,
    item: &DrugSearchItem,
    strength_index: usize,
) {
    let quantity = u32::try_from(widgets.quantity.value_as_int()).unwrap_or(0);
    let instructions = widgets.instructions.text().to_string();

    let outcome = Prescription::from_selection(item, strength_index, instructions, quantity)
        .and_then(|rx| {
            let name = rx.name.clone();
            state.borrow_mut().tracker.add_prescription(rx)?;
            Ok(name)
        });

    match outcome {
        Ok(name) => {
            let default_quantity = {
                let mut s = state.borrow_mut();
                s.results.clear();
                s.default_quantity
            };
            widgets.instructions.set_text("");
            widgets.quantity.set_value(f64::from(default_quantity));
            clear(&widgets.results);
            show_banner(widgets, &format!("✓ Prescription added: {}", name));
        }
        Err(err) => report_failure(widgets, "add prescription", &err),
    }
    rebuild_inventory(state, widgets);
}

fn report_failure(widgets: &Widgets, action: &str, err: &Error) {
    tracing::error!("Failed to {}: {}", action, err);
    let suffix = if err.is_store_failure() {
        " Your change was NOT saved."
    } else {
        ""
    };
    show_banner(widgets, &format!("⚠ Could not {}: {}.{}", action, err, suffix));
}

fn rebuild_inventory(state: &Rc<RefCell<UiState>>, widgets: &Widgets) {
    clear(&widgets.inventory);

    let prescriptions = state.borrow().tracker.prescriptions().to_vec();
    if prescriptions.is_empty() {
        let empty = gtk::Label::new(Some("No prescriptions added yet."));
        empty.add_css_class("dim-label");
        widgets.inventory.append(&empty);
        return;
    }

    for p in prescriptions {
        widgets.inventory.append(&prescription_card(state, widgets, &p));
    }
}

fn prescription_card(
    state: &Rc<RefCell<UiState>>,
    widgets: &Widgets,
    p: &Prescription,
) -> gtk::Box {
    let card = gtk::Box::new(gtk::Orientation::Vertical, 4);
    card.add_css_class("card");

    let title = gtk::Label::new(Some(&p.name));
    title.set_xalign(0.0);
    title.add_css_class("heading");
    card.append(&title);

    let dosage = gtk::Label::new(Some(&p.dosage));
    dosage.set_xalign(0.0);
    dosage.add_css_class("dim-label");
    card.append(&dosage);

    if !p.instructions.is_empty() {
        let instructions = gtk::Label::new(Some(&p.instructions));
        instructions.set_xalign(0.0);
        card.append(&instructions);
    }

    let remaining = gtk::Label::new(Some(&format!(
        "Remaining: {} / {}",
        p.remaining(),
        p.quantity
    )));
    remaining.set_xalign(0.0);
    remaining.add_css_class(if p.is_low() { "error" } else { "success" });
    card.append(&remaining);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 6);
    card.append(&buttons);

    let take = gtk::Button::with_label("Take Pill");
    take.set_sensitive(p.remaining() > 0);
    buttons.append(&take);

    let refill_qty = gtk::SpinButton::with_range(1.0, 1000.0, 1.0);
    refill_qty.set_value(f64::from(p.quantity));
    buttons.append(&refill_qty);

    let refill = gtk::Button::with_label("Refill");
    buttons.append(&refill);

    let remove = gtk::Button::with_label("Remove");
    remove.add_css_class("destructive-action");
    buttons.append(&remove);

    if let Some(rxcui) = p.rxcui.clone() {
        let info = gtk::Button::with_label("Info");
        info.connect_clicked(move |_| {
            let url = format!(
                "https://mor.nlm.nih.gov/RxNav/search?searchBy=RXCUI&searchTerm={}",
                rxcui
            );
            if let Err(err) = open::that(&url) {
                tracing::warn!("Failed to open {}: {}", url, err);
            }
        });
        buttons.append(&info);
    }

    {
        let state = state.clone();
        let widgets = widgets.clone();
        let id = p.id.clone();
        take.connect_clicked(move |_| {
            let outcome = state.borrow_mut().tracker.record_dose_taken(&id);
            match outcome {
                Ok(record) => {
                    let queued = state.borrow().in_app.take_pending();
                    match record.alert.or_else(|| queued.into_iter().last()) {
                        Some(alert) => {
                            show_banner(&widgets, &format!("⚠ {}", alert.message()))
                        }
                        None => show_banner(&widgets, ""),
                    }
                }
                Err(err) => report_failure(&widgets, "record dose", &err),
            }
            rebuild_inventory(&state, &widgets);
        });
    }

    {
        let state = state.clone();
        let widgets = widgets.clone();
        let id = p.id.clone();
        refill.connect_clicked(move |_| {
            let quantity = u32::try_from(refill_qty.value_as_int()).unwrap_or(0);
            let outcome = state
                .borrow_mut()
                .tracker
                .refill_prescription(&id, quantity)
                .map(|_| ());
            match outcome {
                Ok(()) => show_banner(&widgets, "✓ Prescription refilled successfully!"),
                Err(err) => report_failure(&widgets, "refill", &err),
            }
            rebuild_inventory(&state, &widgets);
        });
    }

    {
        let state = state.clone();
        let widgets = widgets.clone();
        let id = p.id.clone();
        let name = p.name.clone();
        remove.connect_clicked(move |button| {
            let parent = button
                .root()
                .and_then(|root| root.downcast::<gtk::Window>().ok());
            let state = state.clone();
            let widgets = widgets.clone();
            let id = id.clone();
            confirm_removal(parent.as_ref(), &name, move || {
                let outcome = state
                    .borrow_mut()
                    .tracker
                    .remove_prescription(&id)
                    .map(|_| ());
                if let Err(err) = outcome {
                    report_failure(&widgets, "remove prescription", &err);
                }
                rebuild_inventory(&state, &widgets);
            });
        });
    }

    card
}

fn removal_question(name: &str) -> String {
    format!("Remove {}?", name)
}

/// Ask before deleting; `on_confirm` runs only for the Remove button.
fn confirm_removal(
    parent: Option<&gtk::Window>,
    name: &str,
    on_confirm: impl Fn() + 'static,
) {
    let dialog = gtk::MessageDialog::builder()
        .modal(true)
        .message_type(gtk::MessageType::Question)
        .buttons(gtk::ButtonsType::None)
        .text(removal_question(name))
        .secondary_text("Its remaining count and dose history will be lost.")
        .build();
    dialog.set_transient_for(parent);
    dialog.add_button("Cancel", gtk::ResponseType::Cancel);
    dialog
        .add_button("Remove", gtk::ResponseType::Accept)
        .add_css_class("destructive-action");
    dialog.set_default_response(gtk::ResponseType::Cancel);

    dialog.connect_response(move |dialog, response| {
        dialog.close();
        if response == gtk::ResponseType::Accept {
            on_confirm();
        }
    });
    dialog.present();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxalert_core::{ConsoleAlerts, InventoryStore};
    use std::cell::Cell;
    use std::time::Instant;
    use tempfile::TempDir;

    fn open_tracker(path: &std::path::Path) -> rxalert_core::Result<Tracker> {
        Tracker::open(Capabilities {
            search: Box::new(RxTermsClient::new(&Config::default().search)?),
            store: Box::new(JsonFileStore::new(path)),
            alerts: Box::new(ConsoleAlerts::new(Vec::new())),
        })
    }

    #[test]
    fn test_session_opens_once_and_shares_state() {
        let session: Session<u32> = Session::new();
        let opens = Cell::new(0);

        let first = session
            .get_or_open(|| {
                opens.set(opens.get() + 1);
                Ok::<_, Error>(1)
            })
            .unwrap();
        let second = session
            .get_or_open(|| {
                opens.set(opens.get() + 1);
                Ok::<_, Error>(2)
            })
            .unwrap();

        assert_eq!(opens.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(*second.borrow(), 1);
    }

    #[test]
    fn test_session_retries_after_failed_open() {
        let session: Session<u32> = Session::new();

        let failed = session.get_or_open(|| Err(Error::Config("unreadable".into())));
        assert!(failed.is_err());

        let opened = session.get_or_open(|| Ok::<_, Error>(7)).unwrap();
        assert_eq!(*opened.borrow(), 7);
    }

    #[test]
    fn test_doses_from_two_activations_both_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prescriptions.json");
        let rx = Prescription::new("Ibuprofen", "200 mg Tab", "", 30, None).unwrap();
        let id = rx.id.clone();
        JsonFileStore::new(&path).save(&[rx]).unwrap();

        let session: Session<Tracker> = Session::new();
        for _activation in 0..2 {
            let tracker = session.get_or_open(|| open_tracker(&path)).unwrap();
            tracker.borrow_mut().record_dose_taken(&id).unwrap();
        }

        let stored = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(stored[0].taken, 2);
        assert_eq!(stored[0].remaining(), 28);
    }

    #[test]
    fn test_debouncer_runs_only_last_of_burst() {
        let context = glib::MainContext::default();
        let _owner = context.acquire().unwrap();

        let fired = Rc::new(RefCell::new(Vec::new()));
        let debouncer = Debouncer::new(Duration::from_millis(50));
        for term in ["i", "ib", "ibu"] {
            let fired = fired.clone();
            debouncer.call(move || fired.borrow_mut().push(term));
        }

        let deadline = Instant::now() + Duration::from_millis(400);
        while Instant::now() < deadline {
            context.iteration(false);
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(*fired.borrow(), vec!["ibu"]);
        assert!(debouncer.pending.borrow().is_none());
    }

    #[test]
    fn test_removal_question_names_prescription() {
        assert_eq!(
            removal_question("Lisinopril 10 mg Tab"),
            "Remove Lisinopril 10 mg Tab?"
        );
    }

    #[test]
    fn test_pill_icon_is_square_argb() {
        let icon = pill_icon(22);
        assert_eq!(icon.data.len(), 22 * 22 * 4);
        // Corners are transparent, the centre row is painted.
        assert_eq!(&icon.data[..4], &[0, 0, 0, 0]);
        let centre = ((11 * 22 + 5) * 4) as usize;
        assert_eq!(icon.data[centre], 0xFF);
    }
}
