use std::cell::RefCell;

use gloo_storage::Storage;
use leptos::prelude::*;
use oblast_map_core::{MapMode, PinBoard, Point};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::api::ApiClient;
use crate::map_view::MapView;
use crate::modals::ModalHost;

const SETTINGS_KEY: &str = "oblast_map_settings";

struct KeydownBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Newtype wrappers so each signal gets its own context slot.
#[derive(Clone, Copy)]
pub(crate) struct ActiveMode(pub RwSignal<MapMode>);
#[derive(Clone, Copy)]
pub(crate) struct AlwaysShowLabels(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct Pins(pub RwSignal<PinBoard>);
#[derive(Clone, Copy)]
pub(crate) struct ActiveModal(pub RwSignal<Option<Modal>>);

/// Collaborator dialogs opened by map clicks.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Modal {
    RegionDetails { region_id: String },
    AuthRequired { region_id: String },
    CreatePin { region_id: String, position: Point },
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    mode: MapMode,
    always_show_labels: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: MapMode::Discover,
            always_show_labels: false,
        }
    }
}

/// Root application component. Provides shared signals via context.
#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let mode: RwSignal<MapMode> = RwSignal::new(saved.mode);
    let always_show_labels: RwSignal<bool> = RwSignal::new(saved.always_show_labels);
    let pins: RwSignal<PinBoard> = RwSignal::new(PinBoard::new());
    let modal: RwSignal<Option<Modal>> = RwSignal::new(None);

    provide_context(ActiveMode(mode));
    provide_context(AlwaysShowLabels(always_show_labels));
    provide_context(Pins(pins));
    provide_context(ActiveModal(modal));
    provide_context(ApiClient::default());

    // Persist settings to localStorage on any change
    Effect::new(move || {
        let settings = Settings {
            mode: mode.get(),
            always_show_labels: always_show_labels.get(),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    // Switching tabs closes whatever dialog belonged to the old mode.
    Effect::new(move || {
        mode.track();
        modal.set(None);
    });

    // Escape closes the open dialog
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                if e.key() == "Escape" && modal.get_untracked().is_some() {
                    modal.set(None);
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div class="app-shell">
            <nav class="mode-tabs">
                <ModeTab label="Discovering Ukraine" target=MapMode::Discover />
                <ModeTab label="Your Adventures" target=MapMode::Adventures />
                <label class="labels-toggle">
                    <input
                        type="checkbox"
                        prop:checked=move || always_show_labels.get()
                        on:change=move |_| always_show_labels.update(|v| *v = !*v)
                    />
                    "Region names"
                </label>
            </nav>
            <MapView />
            <ModalHost />
        </div>
    }
}

#[component]
fn ModeTab(label: &'static str, target: MapMode) -> impl IntoView {
    let ActiveMode(mode) = expect_context();

    view! {
        <button
            class="mode-tab"
            class:active=move || mode.get() == target
            on:click=move |_| {
                if mode.get_untracked() != target {
                    mode.set(target);
                }
            }
        >
            {label}
        </button>
    }
}
