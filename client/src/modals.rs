use leptos::prelude::*;
use oblast_map_core::api::{
    CertificateEligibility, CreatePinRequest, DonationStatus, attachable_images,
};
use oblast_map_core::config::MAX_PIN_IMAGES;
use oblast_map_core::pins::PinDraft;
use oblast_map_core::{
    AnswerSheet, ApiError, PinType, Point, QuizScore, RegionCatalog, RegionQuiz,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Blob, BlobPropertyBag, File, HtmlAnchorElement, HtmlInputElement, Url};

use crate::api::ApiClient;
use crate::app::{ActiveModal, Modal, Pins};
use crate::assets;
use crate::session;

const CERTIFICATE_FILE_NAME: &str = "certificate.pdf";
const CERTIFICATE_MIME: &str = "application/pdf";

/// Renders whichever dialog the map last asked for.
#[component]
pub fn ModalHost() -> impl IntoView {
    let ActiveModal(modal) = expect_context();

    move || match modal.get() {
        None => ().into_any(),
        Some(Modal::RegionDetails { region_id }) => {
            view! { <RegionDetails region_id=region_id /> }.into_any()
        }
        Some(Modal::AuthRequired { region_id }) => {
            view! { <AuthRequired region_id=region_id /> }.into_any()
        }
        Some(Modal::CreatePin {
            region_id,
            position,
        }) => view! { <CreatePinDialog region_id=region_id position=position /> }.into_any(),
    }
}

fn region_name(region_id: &str) -> String {
    RegionCatalog::ukraine().display_name(region_id).to_string()
}

/// Backdrop + panel. Clicking the backdrop closes the dialog.
#[component]
fn Dialog(title: String, children: Children) -> impl IntoView {
    let ActiveModal(modal) = expect_context();

    view! {
        <div class="modal-backdrop" on:click=move |_| modal.set(None)>
            <div class="modal" on:click=|e| e.stop_propagation()>
                <div class="modal-header">
                    <h2>{title}</h2>
                    <button class="modal-close" on:click=move |_| modal.set(None)>
                        "×"
                    </button>
                </div>
                {children()}
            </div>
        </div>
    }
}

#[derive(Clone, Debug, PartialEq)]
enum DownloadState {
    Idle,
    Working,
    Failed(String),
}

/// Which panel of the region dialog is showing.
#[derive(Clone, Debug, PartialEq)]
enum DetailsStep {
    Info,
    Test,
    Results(QuizScore),
}

#[component]
fn RegionDetails(region_id: String) -> impl IntoView {
    let api = StoredValue::new(expect_context::<ApiClient>());
    let name = region_name(&region_id);
    let region = StoredValue::new((region_id.clone(), name.clone()));
    let logged_in = session::is_authenticated();

    let eligibility: RwSignal<Option<Result<CertificateEligibility, ApiError>>> =
        RwSignal::new(None);
    let donation: RwSignal<Option<DonationStatus>> = RwSignal::new(None);
    let download: RwSignal<DownloadState> = RwSignal::new(DownloadState::Idle);

    let quiz: RwSignal<Option<Result<RegionQuiz, String>>> = RwSignal::new(None);
    let step: RwSignal<DetailsStep> = RwSignal::new(DetailsStep::Info);
    let answers: RwSignal<AnswerSheet> = RwSignal::new(AnswerSheet::default());
    let saved: RwSignal<Option<Result<(), String>>> = RwSignal::new(None);

    spawn_local(async move {
        let loaded = assets::quiz_book().await.and_then(|book| {
            book.get(&region_id)
                .cloned()
                .ok_or_else(|| "No questions for this region yet.".to_string())
        });
        if let Err(message) = &loaded {
            tracing::warn!(region = %region_id, %message, "region quiz unavailable");
        }
        quiz.set(Some(loaded));
    });

    let refresh_progress = move || {
        let api = api.get_value();
        spawn_local(async move {
            eligibility.set(Some(api.certificate_eligibility().await));
            match api.donation_status().await {
                Ok(status) => donation.set(Some(status)),
                Err(err) => tracing::warn!(error = %err, "donation status unavailable"),
            }
        });
    };
    if logged_in {
        refresh_progress();
    }

    let on_download = move |_| {
        if download.get_untracked() == DownloadState::Working {
            return;
        }
        download.set(DownloadState::Working);
        let api = api.get_value();
        spawn_local(async move {
            match save_certificate(&api).await {
                Ok(()) => download.set(DownloadState::Idle),
                Err(message) => {
                    tracing::warn!(%message, "certificate download failed");
                    download.set(DownloadState::Failed(message));
                }
            }
        });
    };

    let start_test = move |_| {
        answers.set(AnswerSheet::default());
        saved.set(None);
        step.set(DetailsStep::Test);
    };
    let back_to_info = move |_| {
        answers.set(AnswerSheet::default());
        step.set(DetailsStep::Info);
    };

    let finish_test = move |_| {
        let Some(score) = quiz.with_untracked(|q| match q {
            Some(Ok(quiz)) => answers.with_untracked(|a| a.is_complete(quiz).then(|| quiz.score(a))),
            _ => None,
        }) else {
            return;
        };
        let (region_id, region_name) = region.get_value();
        tracing::info!(
            region = %region_id,
            correct = score.correct,
            total = score.total,
            "region test finished"
        );
        step.set(DetailsStep::Results(score));
        if !session::is_authenticated() {
            return;
        }
        let submission = score.submission(&region_id, &region_name);
        let api = api.get_value();
        spawn_local(async move {
            match api.submit_test(&submission).await {
                Ok(()) => {
                    saved.set(Some(Ok(())));
                    refresh_progress();
                }
                Err(err) => {
                    tracing::warn!(region = %submission.region_id, error = %err, "test result not saved");
                    saved.set(Some(Err(err.to_string())));
                }
            }
        });
    };

    let certificate = move || {
        if !logged_in {
            return view! {
                <p class="modal-hint">"Sign in to track your progress and earn a certificate."</p>
            }
            .into_any();
        }
        match eligibility.get() {
            None => view! { <p class="modal-hint">"Checking certificate status…"</p> }.into_any(),
            Some(Err(err)) => {
                view! { <p class="modal-error">{err.to_string()}</p> }.into_any()
            }
            Some(Ok(status)) => {
                let donated = donation
                    .get()
                    .map(|d| d.has_donated)
                    .unwrap_or(status.has_donated);
                let progress = format!(
                    "Regions passed: {} of {}",
                    status.passed_regions, status.total_regions
                );
                view! {
                    <div class="certificate-status">
                        <p>{progress}</p>
                        <p>{if donated { "Donation received" } else { "No donation yet" }}</p>
                        {status.message.map(|m| view! { <p class="modal-hint">{m}</p> })}
                        <button
                            class="primary"
                            prop:disabled=move || {
                                !status.eligible || download.get() == DownloadState::Working
                            }
                            on:click=on_download
                        >
                            "Download certificate"
                        </button>
                        {move || match download.get() {
                            DownloadState::Failed(message) => {
                                view! { <p class="modal-error">{message}</p> }.into_any()
                            }
                            _ => ().into_any(),
                        }}
                    </div>
                }
                .into_any()
            }
        }
    };

    let info = move || {
        let about = match quiz.get() {
            None => view! { <p class="modal-hint">"Loading region details…"</p> }.into_any(),
            Some(Err(message)) => view! { <p class="modal-hint">{message}</p> }.into_any(),
            Some(Ok(details)) => {
                let can_test = details.has_questions();
                view! {
                    <p class="region-description">{details.description}</p>
                    {details.details_link.map(|href| view! {
                        <a class="region-link" href=href target="_blank" rel="noopener">
                            "More about this region"
                        </a>
                    })}
                    <button class="primary" prop:disabled=!can_test on:click=start_test>
                        "Take the test"
                    </button>
                }
                .into_any()
            }
        };
        view! {
            {about}
            <div class="region-details">{certificate}</div>
        }
    };

    let test = move || {
        let Some(Ok(details)) = quiz.get() else {
            return ().into_any();
        };
        let total = details.tests.len();
        let complete = move || quiz.with(|q| match q {
            Some(Ok(quiz)) => answers.with(|a| a.is_complete(quiz)),
            _ => false,
        });
        let questions = details
            .tests
            .into_iter()
            .enumerate()
            .map(|(qi, question)| {
                let options = question
                    .options
                    .into_iter()
                    .enumerate()
                    .map(|(oi, option)| {
                        let chosen = move || answers.with(|a| a.selected(qi) == Some(oi));
                        view! {
                            <label class="quiz-option" class:selected=chosen>
                                <input
                                    type="radio"
                                    name=format!("question-{qi}")
                                    prop:checked=chosen
                                    on:change=move |_| answers.update(|a| a.select(qi, oi))
                                />
                                <span>{option}</span>
                            </label>
                        }
                    })
                    .collect_view();
                view! {
                    <div class="quiz-question">
                        <div class="quiz-progress">{format!("Question {} of {total}", qi + 1)}</div>
                        <div class="quiz-text">{question.question}</div>
                        {question.image.map(|src| view! {
                            <img
                                class="quiz-image"
                                src=src
                                alt=format!("Illustration for question {}", qi + 1)
                            />
                        })}
                        <div class="quiz-options">{options}</div>
                    </div>
                }
            })
            .collect_view();
        view! {
            <div class="quiz-questions">{questions}</div>
            <div class="modal-actions">
                <button class="primary" prop:disabled=move || !complete() on:click=finish_test>
                    "Submit answers"
                </button>
                <button on:click=back_to_info>"Cancel"</button>
            </div>
        }
        .into_any()
    };

    let results = move |score: QuizScore| {
        let saved_note = move || match saved.get() {
            _ if !logged_in => {
                view! { <p class="modal-hint">"Sign in to save your results."</p> }.into_any()
            }
            None => ().into_any(),
            Some(Ok(())) => {
                view! { <p class="modal-hint">"Result saved to your progress."</p> }.into_any()
            }
            Some(Err(message)) => view! {
                <p class="modal-error">{format!("Result not saved: {message}")}</p>
            }
            .into_any(),
        };
        view! {
            <div class="quiz-results">
                <div class="quiz-score">{format!("{} / {}", score.correct, score.total)}</div>
                <p>{format!("{}% correct answers", score.percentage)}</p>
                <p class="quiz-grade">{score.grade().message()}</p>
                {saved_note}
                <div class="modal-actions">
                    <button class="primary" on:click=start_test>"Try again"</button>
                    <button on:click=back_to_info>"Back"</button>
                </div>
            </div>
        }
    };

    let body = move || match step.get() {
        DetailsStep::Info => info().into_any(),
        DetailsStep::Test => test(),
        DetailsStep::Results(score) => results(score).into_any(),
    };

    view! {
        <Dialog title=name>
            {body}
        </Dialog>
    }
}

async fn save_certificate(api: &ApiClient) -> Result<(), String> {
    let bytes = api
        .download_certificate()
        .await
        .map_err(|e| e.to_string())?;
    offer_download(&bytes, CERTIFICATE_MIME, CERTIFICATE_FILE_NAME)
        .map_err(|e| format!("could not save the certificate: {e:?}"))
}

/// Hand bytes to the browser as a file download.
fn offer_download(bytes: &[u8], mime: &str, file_name: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document not available"))?;

    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Url::revoke_object_url(&url)
}

#[component]
fn AuthRequired(region_id: String) -> impl IntoView {
    let ActiveModal(modal) = expect_context();
    let name = region_name(&region_id);

    view! {
        <Dialog title="Sign in required".to_string()>
            <p>{format!("Sign in to pin your adventures in {name}.")}</p>
            <button class="primary" on:click=move |_| modal.set(None)>
                "OK"
            </button>
        </Dialog>
    }
}

#[component]
fn CreatePinDialog(region_id: String, position: Point) -> impl IntoView {
    let ActiveModal(modal) = expect_context();
    let Pins(pins) = expect_context();
    let api: ApiClient = expect_context();

    let name = region_name(&region_id);
    let region = StoredValue::new((region_id, name.clone()));
    let pin_type: RwSignal<Option<PinType>> = RwSignal::new(None);
    let text: RwSignal<String> = RwSignal::new(String::new());
    let author: RwSignal<String> = RwSignal::new(String::new());
    let photos_ref = NodeRef::<leptos::html::Input>::new();
    let photo_count: RwSignal<usize> = RwSignal::new(0);

    let incomplete =
        move || pin_type.get().is_none() || text.with(|t| t.trim().is_empty());

    let submit = move |_| {
        let Some(kind) = pin_type.get_untracked() else {
            return;
        };
        let description = text.with_untracked(|t| t.trim().to_string());
        if description.is_empty() {
            return;
        }
        let (region_id, region_name) = region.get_value();
        let files = photos_ref
            .get_untracked()
            .map(|input| selected_files(&input))
            .unwrap_or_default();
        // Local previews until the backend serves the uploaded copies.
        let previews = files
            .iter()
            .filter_map(|file| Url::create_object_url_with_blob(file).ok())
            .collect();
        let draft = PinDraft {
            region_id: region_id.clone(),
            pin_type: kind,
            text: description.clone(),
            author_name: Some(author.get_untracked()),
            images: previews,
            position,
        };
        let Some(local_id) = pins.try_update(|board| board.add_optimistic(draft)) else {
            return;
        };
        modal.set(None);

        let request = CreatePinRequest {
            region_id,
            region_name,
            pin_type: kind,
            description,
            x: Some(position.x),
            y: Some(position.y),
        };
        let api = api.clone();
        spawn_local(async move {
            let submitted = if files.is_empty() {
                api.create_pin(&request).await
            } else {
                api.create_pin_with_images(&request, &files).await
            };
            match submitted {
                Ok(remote_id) => {
                    tracing::info!(
                        region = %request.region_id,
                        ?remote_id,
                        photos = files.len(),
                        "pin submitted"
                    );
                    pins.update(|board| {
                        board.confirm(&local_id, remote_id);
                    });
                }
                Err(err) => {
                    tracing::warn!(region = %request.region_id, error = %err, "pin submission failed");
                    pins.update(|board| {
                        board.mark_failed(&local_id);
                    });
                }
            }
        });
    };

    let type_button = move |kind: PinType| {
        view! {
            <button
                class="pin-type"
                class:selected=move || pin_type.get() == Some(kind)
                style:border-color=kind.accent()
                on:click=move |_| pin_type.set(Some(kind))
            >
                <img src=kind.icon() alt="" />
                {kind.label()}
            </button>
        }
    };

    view! {
        <Dialog title=format!("New adventure in {name}")>
            <div class="pin-type-choice">
                {type_button(PinType::Visited)}
                {type_button(PinType::WantToVisit)}
            </div>
            <textarea
                class="pin-text"
                placeholder="Tell us about this place"
                prop:value=move || text.get()
                on:input=move |ev| text.set(event_target_value(&ev))
            ></textarea>
            <input
                class="pin-author"
                type="text"
                placeholder="Your name (optional)"
                prop:value=move || author.get()
                on:input=move |ev| author.set(event_target_value(&ev))
            />
            <label class="pin-photos">
                {format!("Photos (up to {MAX_PIN_IMAGES})")}
                <input
                    type="file"
                    accept="image/*"
                    multiple
                    node_ref=photos_ref
                    on:change=move |_| {
                        let count = photos_ref
                            .get_untracked()
                            .and_then(|input| input.files())
                            .map(|list| list.length() as usize)
                            .unwrap_or(0);
                        photo_count.set(count);
                    }
                />
            </label>
            {move || {
                (photo_count.get() > MAX_PIN_IMAGES)
                    .then(|| {
                        view! {
                            <p class="modal-hint">
                                {format!("Only the first {MAX_PIN_IMAGES} photos will be attached.")}
                            </p>
                        }
                    })
            }}
            <button class="primary" prop:disabled=incomplete on:click=submit>
                "Pin it"
            </button>
        </Dialog>
    }
}

/// Files picked in a photo input, capped to what one pin may carry.
fn selected_files(input: &HtmlInputElement) -> Vec<File> {
    let Some(list) = input.files() else {
        return Vec::new();
    };
    let files: Vec<File> = (0..list.length()).filter_map(|i| list.get(i)).collect();
    attachable_images(&files).to_vec()
}
