use chrono::{DateTime, Local};
use sauron::{
    html::{attributes, attributes::*, *},
    prelude::*,
};
use synapse_shared::display::{
    category_display, category_stats, date_display_info, priority_display, status_counts,
    status_display,
};
use synapse_shared::store::decode_slot;
use synapse_shared::{Category, Priority, Status, StoreConfig, Task, TaskStore, TaskUpdate};
use tracing::level_filters::LevelFilter;
use web_sys::window;

pub mod form;
pub mod logging;
pub mod storage;

use form::TaskForm;
use storage::BrowserStorage;

const SEED_TASKS: &str = include_str!("../seed_tasks.json");

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Dashboard,
    Detail(u32),
}

impl Page {
    fn to_path(&self) -> String {
        match self {
            Page::Dashboard => "/".to_string(),
            Page::Detail(id) => format!("/detail/{id}"),
        }
    }

    fn from_path(path: &str) -> Self {
        path.strip_prefix("/detail/")
            .and_then(|id| id.trim_end_matches('/').parse().ok())
            .map(Page::Detail)
            .unwrap_or(Page::Dashboard)
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    NavigateTo(Page),

    // Dialog
    OpenAddDialog,
    OpenEditDialog(u32),
    CloseDialog,
    SetTitle(String),
    SetDescription(String),
    SetCategory(String),
    SetPriority(String),
    SetStatus(String),
    SetTargetDate(String),
    ClearTargetDate,
    SubmitForm,

    // Tasks
    ChangeStatus(u32, String),
    DeleteTask(u32),
}

/// The add/edit dialog. `editing` is `None` when adding.
#[derive(Debug, Clone)]
struct Dialog {
    editing: Option<u32>,
    form: TaskForm,
}

pub struct Model {
    current_page: Page,
    store: TaskStore<BrowserStorage>,
    dialog: Option<Dialog>,
}

impl Default for Model {
    fn default() -> Self {
        let config = StoreConfig::default().with_seed(seed_tasks());
        Self {
            current_page: Page::Dashboard,
            store: TaskStore::open(BrowserStorage, config),
            dialog: None,
        }
    }
}

fn seed_tasks() -> Vec<Task> {
    let (tasks, problems) = decode_slot(SEED_TASKS);
    for problem in problems {
        tracing::warn!(error = %problem, "bundled seed entry skipped");
    }
    tasks
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        if let Some(window) = window() {
            if let Ok(pathname) = window.location().pathname() {
                self.current_page = Page::from_path(&pathname);
            }
        }
        setup_popstate_listener();
        Cmd::none()
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::NavigateTo(page) => {
                self.navigate(page);
            }
            Msg::OpenAddDialog => {
                self.dialog = Some(Dialog {
                    editing: None,
                    form: TaskForm::default(),
                });
            }
            Msg::OpenEditDialog(id) => {
                if let Some(task) = self.store.get(id) {
                    self.dialog = Some(Dialog {
                        editing: Some(id),
                        form: TaskForm::for_task(task),
                    });
                }
            }
            Msg::CloseDialog => {
                self.dialog = None;
            }
            Msg::SetTitle(title) => self.edit_form(|form| form.title = title),
            Msg::SetDescription(description) => {
                self.edit_form(|form| form.description = description)
            }
            Msg::SetCategory(value) => match value.parse::<Category>() {
                Ok(category) => self.edit_form(|form| form.category = category),
                Err(err) => tracing::warn!(error = %err, "ignoring category selection"),
            },
            Msg::SetPriority(value) => match value.parse::<Priority>() {
                Ok(priority) => self.edit_form(|form| form.priority = priority),
                Err(err) => tracing::warn!(error = %err, "ignoring priority selection"),
            },
            Msg::SetStatus(value) => match value.parse::<Status>() {
                Ok(status) => self.edit_form(|form| form.status = status),
                Err(err) => tracing::warn!(error = %err, "ignoring status selection"),
            },
            Msg::SetTargetDate(value) => self.edit_form(|form| form.target_date = value),
            Msg::ClearTargetDate => self.edit_form(|form| form.target_date.clear()),
            Msg::SubmitForm => self.submit_form(),
            Msg::ChangeStatus(id, value) => match value.parse::<Status>() {
                Ok(status) => {
                    if let Err(err) = self.store.edit(id, TaskUpdate::status(status)) {
                        tracing::warn!(id, error = %err, "status change failed");
                    }
                }
                Err(err) => tracing::warn!(id, error = %err, "ignoring status selection"),
            },
            Msg::DeleteTask(id) => self.delete_task(id),
        }
        Cmd::none()
    }

    fn view(&self) -> Node<Msg> {
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [
                self.view_header(),
                div(
                    [class("max-w-6xl mx-auto px-6 py-8")],
                    [match self.current_page {
                        Page::Dashboard => self.view_dashboard(),
                        Page::Detail(id) => self.view_detail(id),
                    }],
                ),
                match &self.dialog {
                    Some(dialog) => self.view_dialog(dialog),
                    None => span([], []),
                },
            ],
        )
    }
}

impl Model {
    fn navigate(&mut self, page: Page) {
        if let Some(history) = window().and_then(|w| w.history().ok()) {
            let _ = history.push_state_with_url(
                &wasm_bindgen::JsValue::NULL,
                "",
                Some(page.to_path().as_str()),
            );
        }
        self.current_page = page;
    }

    fn edit_form(&mut self, change: impl FnOnce(&mut TaskForm)) {
        if let Some(dialog) = self.dialog.as_mut() {
            change(&mut dialog.form);
            dialog.form.error = None;
        }
    }

    fn submit_form(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let input = match dialog.form.submit() {
            Ok(input) => input,
            Err(err) => {
                dialog.form.error = Some(err.to_string());
                return;
            }
        };

        let saved = match dialog.editing {
            Some(id) => self.store.edit(id, TaskUpdate::from(input)),
            None => self.store.add(input),
        };
        match saved {
            Ok(_) => self.dialog = None,
            Err(err) => dialog.form.error = Some(err.to_string()),
        }
    }

    // Confirmation is a view concern; the store removes unconditionally.
    fn delete_task(&mut self, id: u32) {
        let Some(task) = self.store.get(id) else {
            tracing::warn!(id, "delete requested for unknown task");
            return;
        };
        let prompt = format!(
            "Are you sure you want to delete task \"{}\"?\n\nThis action cannot be undone.",
            task.title
        );
        let confirmed = window()
            .and_then(|w| w.confirm_with_message(&prompt).ok())
            .unwrap_or(false);
        if confirmed && self.store.remove(id) && self.current_page == Page::Detail(id) {
            self.navigate(Page::Dashboard);
        }
    }

    fn view_header(&self) -> Node<Msg> {
        header([class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")], [
            div([class("max-w-6xl mx-auto px-6 py-4")], [
                a([
                    href(Page::Dashboard.to_path()),
                    on_click(|event| {
                        event.prevent_default();
                        Msg::NavigateTo(Page::Dashboard)
                    }),
                    class("text-4xl font-bold text-ctp-blue"),
                ], [text("Synapse")]),
            ]),
        ])
    }

    fn view_dashboard(&self) -> Node<Msg> {
        let counts = status_counts(self.store.list());
        div([class("space-y-8")], [
            div([class("flex items-center justify-between")], [
                h1([class("text-3xl font-bold text-ctp-text")], [text("Tasks")]),
                button([
                    on_click(|_| Msg::OpenAddDialog),
                    class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200"),
                ], [text("+ Add Task")]),
            ]),
            div([class("grid grid-cols-1 md:grid-cols-4 gap-6")], [
                self.stat_card("Total", &counts.total().to_string(), "📝"),
                self.stat_card("To Do", &counts.todo.to_string(), "○"),
                self.stat_card("In Progress", &counts.in_progress.to_string(), "▶"),
                self.stat_card("Done", &counts.done.to_string(), "✓"),
            ]),
            self.view_category_progress(),
            self.view_task_grid(),
        ])
    }

    fn stat_card(&self, card_title: &str, value: &str, icon: &str) -> Node<Msg> {
        div([class("bg-ctp-surface1 rounded-lg p-6 border border-ctp-surface2")], [
            div([class("flex items-center justify-between")], [
                div([], [
                    p([class("text-sm font-medium text-ctp-subtext0")], [text(card_title)]),
                    p([class("text-2xl font-bold text-ctp-text mt-1")], [text(value)]),
                ]),
                span([class("text-3xl")], [text(icon)]),
            ]),
        ])
    }

    fn view_category_progress(&self) -> Node<Msg> {
        let stats = category_stats(self.store.list());
        let body = if stats.is_empty() {
            p([class("text-sm text-ctp-subtext0")], [text("No tasks available")])
        } else {
            div(
                [class("grid grid-cols-1 gap-4 md:grid-cols-2 lg:grid-cols-3")],
                stats.iter().map(|entry| {
                    let colors = category_display(entry.category);
                    div([class("space-y-2")], [
                        div([class("flex items-center justify-between")], [
                            span([class("text-sm font-medium text-ctp-text")], [text(entry.category.as_str())]),
                            span([class("text-xs text-ctp-subtext0")], [text(&format!(
                                "{}/{} ({}%)",
                                entry.completed, entry.total, entry.completion_rate
                            ))]),
                        ]),
                        div([class(&format!("h-2 w-full rounded-full {}", colors.progress_background_color))], [
                            div([
                                class(&format!("{} h-2 rounded-full transition-all duration-300", colors.progress_color)),
                                attributes::styles([("width", format!("{}%", entry.completion_rate))]),
                            ], []),
                        ]),
                    ])
                }),
            )
        };

        div([class("bg-ctp-surface0 rounded-lg shadow-lg p-6 border border-ctp-surface1")], [
            h2([class("text-xl font-semibold text-ctp-text mb-4")], [text("Task Progress")]),
            body,
        ])
    }

    fn view_task_grid(&self) -> Node<Msg> {
        let tasks = self.store.sorted();
        if tasks.is_empty() {
            return div([class("text-center py-12 bg-ctp-surface0 rounded-lg border-2 border-dashed border-ctp-surface2")], [
                p([class("text-ctp-subtext0")], [text("No tasks yet. Add one to get started!")]),
            ]);
        }

        let now = Local::now();
        div(
            [class("grid gap-4 sm:grid-cols-2 lg:grid-cols-3")],
            tasks.iter().map(|task| self.view_task(task, &now)),
        )
    }

    fn view_task(&self, task: &Task, now: &DateTime<Local>) -> Node<Msg> {
        let id = task.id;
        let status = status_display(task.status);
        let priority = priority_display(task.priority);
        let category = category_display(task.category);
        let dates = date_display_info(task, now);

        div([class(&format!(
            "flex flex-col gap-3 p-4 rounded-lg border transition-all duration-200 hover:shadow-md {}",
            if task.is_done() { "bg-ctp-mantle border-ctp-surface1 opacity-75" } else { "bg-ctp-surface0 border-ctp-surface1" }
        ))], [
            div([class("flex items-start justify-between gap-2")], [
                div([class("flex items-start gap-2")], [
                    span([class(&format!("mt-1 rounded-full px-2 py-1 text-sm {} {}", status.badge_color, status.text_color))], [
                        text(status.icon.glyph()),
                    ]),
                    a([
                        href(Page::Detail(id).to_path()),
                        on_click(move |event| {
                            event.prevent_default();
                            Msg::NavigateTo(Page::Detail(id))
                        }),
                        class(&format!(
                            "text-lg font-medium hover:underline {}",
                            if task.is_done() { "line-through text-ctp-subtext0" } else { "text-ctp-text" }
                        )),
                    ], [text(&task.title)]),
                ]),
                self.status_select(task),
            ]),
            if task.description.is_empty() {
                span([], [])
            } else {
                p([class("text-sm text-ctp-subtext1 line-clamp-2")], [text(&task.description)])
            },
            div([class("flex flex-wrap gap-2")], [
                span([class(&format!("px-2 py-1 rounded-full text-xs font-medium text-white {}", category.badge_color))], [
                    text(task.category.as_str()),
                ]),
                span([class(&format!("px-2 py-1 rounded-full text-xs font-medium {} {}", priority.badge_color, priority.text_color))], [
                    text(priority.label),
                ]),
            ]),
            match &dates.target_date {
                Some(target) => span([class(&format!(
                    "text-xs font-medium {}",
                    if target.is_past_due { "text-ctp-red" } else if target.is_today { "text-ctp-peach" } else { "text-ctp-subtext0" }
                ))], [text(&format!("🎯 {} · {}", target.formatted, target.relative))]),
                None => span([], []),
            },
            div([class("flex items-center justify-between pt-2 border-t border-ctp-surface1")], [
                span([class("text-xs text-ctp-subtext0")], [text(&format!("Created {}", dates.created_at.formatted))]),
                div([class("flex gap-2")], [
                    button([
                        on_click(move |_| Msg::OpenEditDialog(id)),
                        class("bg-ctp-blue/20 hover:bg-ctp-blue/30 text-ctp-blue p-2 rounded-md transition-colors duration-200"),
                    ], [text("✏️")]),
                    button([
                        on_click(move |_| Msg::DeleteTask(id)),
                        class("bg-ctp-red/20 hover:bg-ctp-red/30 text-ctp-red p-2 rounded-md transition-colors duration-200"),
                    ], [text("🗑️")]),
                ]),
            ]),
        ])
    }

    fn status_select(&self, task: &Task) -> Node<Msg> {
        let id = task.id;
        select(
            [
                on_input(move |event| Msg::ChangeStatus(id, event.value())),
                class("bg-ctp-surface1 border border-ctp-surface2 rounded-md text-xs text-ctp-text px-2 py-1"),
            ],
            Status::ALL.iter().map(|status| {
                option(
                    [value(status.as_str()), selected(*status == task.status)],
                    [text(status_display(*status).label)],
                )
            }),
        )
    }

    fn view_detail(&self, id: u32) -> Node<Msg> {
        let Some(task) = self.store.get(id) else {
            return div([class("bg-ctp-surface0 rounded-lg p-8 border border-ctp-surface1 text-center space-y-4")], [
                h2([class("text-2xl font-bold text-ctp-text")], [text("Task not found")]),
                p([class("text-ctp-subtext0")], [text(&format!("There is no task with id {id}."))]),
                self.back_link(),
            ]);
        };

        let now = Local::now();
        let dates = date_display_info(task, &now);
        let status = status_display(task.status);
        let priority = priority_display(task.priority);
        let category = category_display(task.category);

        div([class("space-y-6")], [
            self.back_link(),
            div([class("bg-ctp-surface0 rounded-lg shadow-lg p-8 border border-ctp-surface1 space-y-6")], [
                div([class("flex items-start justify-between gap-4")], [
                    div([class("space-y-2")], [
                        h1([class("text-3xl font-bold text-ctp-text")], [text(&task.title)]),
                        div([class("flex flex-wrap gap-2")], [
                            span([class(&format!("px-2 py-1 rounded-full text-xs font-medium text-white {}", category.badge_color))], [
                                text(task.category.as_str()),
                            ]),
                            span([class(&format!("px-2 py-1 rounded-full text-xs font-medium {} {}", priority.badge_color, priority.text_color))], [
                                text(priority.label),
                            ]),
                            span([class(&format!("px-2 py-1 rounded-full text-xs font-medium {} {}", status.badge_color, status.text_color))], [
                                text(&format!("{} {}", status.icon.glyph(), status.label)),
                            ]),
                        ]),
                    ]),
                    div([class("flex gap-2")], [
                        self.status_select(task),
                        button([
                            on_click(move |_| Msg::OpenEditDialog(id)),
                            class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                        ], [text("Edit")]),
                        button([
                            on_click(move |_| Msg::DeleteTask(id)),
                            class("bg-ctp-red hover:bg-ctp-maroon text-ctp-base font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                        ], [text("Delete")]),
                    ]),
                ]),
                p([class("text-ctp-subtext1 whitespace-pre-wrap")], [text(if task.description.is_empty() {
                    "No description."
                } else {
                    task.description.as_str()
                })]),
                div([class("grid grid-cols-1 md:grid-cols-3 gap-4")], [
                    self.date_row("Created", &dates.created_at.formatted, ""),
                    self.date_row("Updated", &dates.updated_at.formatted, ""),
                    match &dates.target_date {
                        Some(target) => self.date_row(
                            "Target",
                            &format!("{} {}", target.formatted, task.target_date.map(|t| t.with_timezone(&Local).format("%H:%M").to_string()).unwrap_or_default()),
                            if target.is_past_due { "Overdue" } else { target.relative.as_str() },
                        ),
                        None => self.date_row("Target", "No target date", ""),
                    },
                ]),
            ]),
        ])
    }

    fn date_row(&self, label: &str, value: &str, note: &str) -> Node<Msg> {
        div([class("bg-ctp-surface1 rounded-lg p-4 border border-ctp-surface2")], [
            p([class("text-sm font-medium text-ctp-subtext0")], [text(label)]),
            p([class("text-lg text-ctp-text mt-1")], [text(value)]),
            p([class("text-xs text-ctp-peach mt-1")], [text(note)]),
        ])
    }

    fn back_link(&self) -> Node<Msg> {
        a([
            href(Page::Dashboard.to_path()),
            on_click(|event| {
                event.prevent_default();
                Msg::NavigateTo(Page::Dashboard)
            }),
            class("text-ctp-blue hover:underline"),
        ], [text("← Back to tasks")])
    }

    fn view_dialog(&self, dialog: &Dialog) -> Node<Msg> {
        let form = &dialog.form;
        let input_class = "w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue focus:border-transparent";

        div([class("fixed inset-0 bg-black/50 flex items-center justify-center p-4")], [
            div([class("bg-ctp-surface1 rounded-lg border border-ctp-surface2 p-6 w-full max-w-lg max-h-[90vh] overflow-y-auto space-y-4")], [
                h2([class("text-xl font-semibold text-ctp-text pb-2 border-b border-ctp-surface2")], [text(
                    if dialog.editing.is_some() { "Edit Task" } else { "Add New Task" },
                )]),
                match &form.error {
                    Some(error) => div([class("bg-ctp-red/20 text-ctp-red px-3 py-2 rounded-md text-sm")], [text(error)]),
                    None => span([], []),
                },
                p([class("block text-sm font-medium text-ctp-subtext1")], [text("Title *")]),
                input([
                    r#type("text"),
                    placeholder("Enter task title"),
                    value(&form.title),
                    on_input(|event| Msg::SetTitle(event.value())),
                    class(input_class),
                ], []),
                p([class("block text-sm font-medium text-ctp-subtext1")], [text("Description")]),
                textarea([
                    placeholder("Enter task description"),
                    value(&form.description),
                    on_input(|event| Msg::SetDescription(event.value())),
                    class(&format!("{input_class} h-24 resize-y")),
                ], []),
                div([class("grid grid-cols-1 gap-3 sm:grid-cols-3")], [
                    self.enum_select("Category", Category::ALL, form.category, |c| c.as_str(), Msg::SetCategory),
                    self.enum_select("Priority", Priority::ALL, form.priority, |p| priority_display(p).label, Msg::SetPriority),
                    self.enum_select("Status", Status::ALL, form.status, |s| status_display(s).label, Msg::SetStatus),
                ]),
                p([class("block text-sm font-medium text-ctp-subtext1")], [text("Target date")]),
                div([class("flex gap-2")], [
                    input([
                        r#type("datetime-local"),
                        value(&form.target_date),
                        on_input(|event| Msg::SetTargetDate(event.value())),
                        class(input_class),
                    ], []),
                    button([
                        on_click(|_| Msg::ClearTargetDate),
                        class("bg-ctp-surface2 hover:bg-ctp-overlay0 text-ctp-text px-3 py-2 rounded-md"),
                        disabled(form.target_date.is_empty()),
                    ], [text("Clear")]),
                ]),
                div([class("flex justify-end gap-2 pt-2")], [
                    button([
                        on_click(|_| Msg::CloseDialog),
                        class("bg-ctp-surface2 hover:bg-ctp-overlay0 text-ctp-text font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                    ], [text("Cancel")]),
                    button([
                        on_click(|_| Msg::SubmitForm),
                        class("bg-ctp-green hover:bg-ctp-teal text-ctp-base font-medium px-4 py-2 rounded-md transition-colors duration-200"),
                    ], [text(if dialog.editing.is_some() { "Save" } else { "Add Task" })]),
                ]),
            ]),
        ])
    }

    fn enum_select<T>(
        &self,
        caption: &str,
        choices: &'static [T],
        current: T,
        label_of: fn(T) -> &'static str,
        on_pick: fn(String) -> Msg,
    ) -> Node<Msg>
    where
        T: Copy + PartialEq + std::fmt::Display,
    {
        div([class("space-y-2")], [
            p([class("block text-sm font-medium text-ctp-subtext1")], [text(caption)]),
            select(
                [
                    on_input(move |event| on_pick(event.value())),
                    class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text"),
                ],
                choices.iter().map(|choice| {
                    option(
                        [value(choice.to_string()), selected(*choice == current)],
                        [text(label_of(*choice))],
                    )
                }),
            ),
        ])
    }
}

// Routing state lives in the URL and tasks live in storage, so a full reload
// on back/forward rebuilds the right page.
fn setup_popstate_listener() {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    let Some(window) = window() else {
        return;
    };

    let callback = Closure::wrap(Box::new(|_event: web_sys::PopStateEvent| {
        if let Some(window) = web_sys::window() {
            let location = window.location();
            tracing::debug!(path = ?location.pathname().ok(), "route changed");
            let _ = location.reload();
        }
    }) as Box<dyn FnMut(_)>);

    if let Err(err) =
        window.add_event_listener_with_callback("popstate", callback.as_ref().unchecked_ref())
    {
        tracing::warn!(error = ?err, "failed to listen for route changes");
    }

    callback.forget();
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::DEBUG);
    Program::mount_to_body(Model::default());
}
