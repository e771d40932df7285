//! In-memory stand-in for the PetFriends HTTP API.
//!
//! # Design
//! Serves the same endpoints as the real service from an
//! `Arc<RwLock<Store>>`. It answers the way a strict service would: unknown
//! keys get 403, non-image photos get 400. `Quirks` switches on the two
//! behaviors the real service has been seen to show instead.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    pub age: String,
    pub pet_photo: String,
    pub created_at: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PetList {
    pub pets: Vec<Pet>,
}

/// Create/update form. Fields are optional so a missing one is a 400 from
/// the handler rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PetForm {
    pub name: Option<String>,
    pub animal_type: Option<String>,
    pub age: Option<String>,
}

impl PetForm {
    fn complete(self) -> Result<(String, String, String), Rejection> {
        match (self.name, self.animal_type, self.age) {
            (Some(name), Some(animal_type), Some(age))
                if !name.is_empty() && !animal_type.is_empty() && !age.is_empty() =>
            {
                Ok((name, animal_type, age))
            }
            _ => Err(Rejection::BadRequest(
                "name, animal_type and age are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: String,
}

/// Deviations from strict behavior observed on the real service.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    /// List all pets even when `auth_key` is missing or unknown.
    pub ignore_auth_on_listing: bool,
    /// Store any uploaded bytes as a photo.
    pub accept_any_photo: bool,
}

impl Quirks {
    pub fn all() -> Self {
        Self {
            ignore_auth_on_listing: true,
            accept_any_photo: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    email: String,
    password: String,
    key: String,
    user_id: String,
}

#[derive(Debug, Default)]
pub struct Store {
    accounts: Vec<Account>,
    /// Newest first.
    pets: Vec<Pet>,
}

impl Store {
    fn account_by_key(&self, headers: &HeaderMap) -> Result<&Account, Rejection> {
        let key = headers
            .get("auth_key")
            .and_then(|v| v.to_str().ok())
            .ok_or(Rejection::Forbidden("Please provide 'auth_key' Header"))?;
        self.accounts
            .iter()
            .find(|a| a.key == key)
            .ok_or(Rejection::Forbidden("Please provide 'auth_key' Header"))
    }

    fn owned_pet_mut(&mut self, user_id: &str, pet_id: &str) -> Result<&mut Pet, Rejection> {
        let pet = self
            .pets
            .iter_mut()
            .find(|p| p.id == pet_id)
            .ok_or(Rejection::NotFound)?;
        if pet.user_id != user_id {
            return Err(Rejection::Forbidden("This pet belongs to another user"));
        }
        Ok(pet)
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    quirks: Quirks,
}

impl AppState {
    pub fn new(quirks: Quirks) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            quirks,
        }
    }

    /// Register an account and return the auth key `/api/key` will issue.
    pub async fn add_account(&self, email: &str, password: &str) -> String {
        let key = Uuid::new_v4().simple().to_string();
        self.store.write().await.accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            key: key.clone(),
            user_id: Uuid::new_v4().simple().to_string(),
        });
        key
    }

    /// Insert a pet owned by `email`. Returns `None` for an unknown account.
    pub async fn seed_pet(&self, email: &str, name: &str, animal_type: &str, age: &str) -> Option<Pet> {
        let mut store = self.store.write().await;
        let user_id = store.accounts.iter().find(|a| a.email == email)?.user_id.clone();
        let pet = new_pet(&user_id, name.to_string(), animal_type.to_string(), age.to_string(), String::new());
        store.pets.insert(0, pet.clone());
        Some(pet)
    }

    pub async fn pets(&self) -> Vec<Pet> {
        self.store.read().await.pets.clone()
    }
}

/// Errors surfaced as HTTP statuses.
#[derive(Debug)]
pub enum Rejection {
    Forbidden(&'static str),
    BadRequest(String),
    NotFound,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
            Rejection::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Rejection::NotFound => (StatusCode::NOT_FOUND, "Pet not found").into_response(),
        }
    }
}

impl From<MultipartError> for Rejection {
    fn from(err: MultipartError) -> Self {
        Rejection::BadRequest(err.to_string())
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/key", get(get_api_key))
        .route("/api/pets", get(list_pets).post(add_pet))
        .route("/api/create_pet_simple", post(add_pet_simple))
        .route("/api/pets/set_photo/{pet_id}", post(set_photo))
        .route("/api/pets/{pet_id}", put(update_pet).delete(delete_pet))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn get_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, Rejection> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let store = state.store.read().await;
    let account = store
        .accounts
        .iter()
        .find(|a| Some(a.email.as_str()) == header("email") && Some(a.password.as_str()) == header("password"))
        .ok_or(Rejection::Forbidden("This user wasn't found in database"))?;
    Ok(Json(json!({ "key": account.key })))
}

async fn list_pets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<PetList>, Rejection> {
    let store = state.store.read().await;
    let caller = store.account_by_key(&headers);
    let pets = match (caller, query.filter.as_str()) {
        (_, filter) if !filter.is_empty() && filter != "my_pets" => {
            return Err(Rejection::BadRequest(format!("Filter value is incorrect: {filter}")))
        }
        (Ok(account), "my_pets") => store
            .pets
            .iter()
            .filter(|p| p.user_id == account.user_id)
            .cloned()
            .collect(),
        (Ok(_), _) => store.pets.clone(),
        (Err(_), "") if state.quirks.ignore_auth_on_listing => store.pets.clone(),
        (Err(rejection), _) => return Err(rejection),
    };
    Ok(Json(PetList { pets }))
}

async fn add_pet(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Pet>, Rejection> {
    let user_id = caller_id(&state, &headers).await?;
    let upload = read_upload(multipart).await?;
    let pet_photo = photo_uri(&upload, state.quirks)?;
    let (name, animal_type, age) = upload.form.complete()?;

    let pet = new_pet(&user_id, name, animal_type, age, pet_photo);
    debug!(pet_id = %pet.id, "pet created with photo");
    state.store.write().await.pets.insert(0, pet.clone());
    Ok(Json(pet))
}

async fn add_pet_simple(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<PetForm>,
) -> Result<Json<Pet>, Rejection> {
    let user_id = caller_id(&state, &headers).await?;
    let (name, animal_type, age) = form.complete()?;

    let pet = new_pet(&user_id, name, animal_type, age, String::new());
    debug!(pet_id = %pet.id, "pet created without photo");
    state.store.write().await.pets.insert(0, pet.clone());
    Ok(Json(pet))
}

async fn set_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(pet_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Pet>, Rejection> {
    let user_id = caller_id(&state, &headers).await?;
    let upload = read_upload(multipart).await?;
    let pet_photo = photo_uri(&upload, state.quirks)?;

    let mut store = state.store.write().await;
    let pet = store.owned_pet_mut(&user_id, &pet_id)?;
    pet.pet_photo = pet_photo;
    Ok(Json(pet.clone()))
}

async fn update_pet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(pet_id): Path<String>,
    Form(form): Form<PetForm>,
) -> Result<Json<Pet>, Rejection> {
    let user_id = caller_id(&state, &headers).await?;
    let (name, animal_type, age) = form.complete()?;

    let mut store = state.store.write().await;
    let pet = store.owned_pet_mut(&user_id, &pet_id)?;
    pet.name = name;
    pet.animal_type = animal_type;
    pet.age = age;
    Ok(Json(pet.clone()))
}

async fn delete_pet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(pet_id): Path<String>,
) -> Result<StatusCode, Rejection> {
    let user_id = caller_id(&state, &headers).await?;
    let mut store = state.store.write().await;
    store.owned_pet_mut(&user_id, &pet_id)?;
    store.pets.retain(|p| p.id != pet_id);
    Ok(StatusCode::OK)
}

async fn caller_id(state: &AppState, headers: &HeaderMap) -> Result<String, Rejection> {
    let store = state.store.read().await;
    Ok(store.account_by_key(headers)?.user_id.clone())
}

struct Photo {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

struct Upload {
    form: PetForm,
    photo: Option<Photo>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Rejection> {
    let mut form = PetForm::default();
    let mut photo = None;
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "pet_photo" => {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?.to_vec();
                photo = Some(Photo { content_type, bytes });
            }
            "name" => form.name = Some(field.text().await?),
            "animal_type" => form.animal_type = Some(field.text().await?),
            "age" => form.age = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(Upload { form, photo })
}

/// Encode the uploaded photo as a data URI, rejecting non-images unless
/// `quirks.accept_any_photo` is set.
fn photo_uri(upload: &Upload, quirks: Quirks) -> Result<String, Rejection> {
    let photo = upload
        .photo
        .as_ref()
        .ok_or_else(|| Rejection::BadRequest("pet_photo is required".to_string()))?;
    let mime = match sniff_image(&photo.bytes) {
        Some(mime) => mime.to_string(),
        None if quirks.accept_any_photo => photo
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        None => return Err(Rejection::BadRequest("pet_photo must be a JPEG or PNG image".to_string())),
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(&photo.bytes)))
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(JPEG_MAGIC) {
        Some("image/jpeg")
    } else if bytes.starts_with(PNG_MAGIC) {
        Some("image/png")
    } else {
        None
    }
}

fn new_pet(user_id: &str, name: String, animal_type: String, age: String, pet_photo: String) -> Pet {
    Pet {
        id: Uuid::new_v4().to_string(),
        name,
        animal_type,
        age,
        pet_photo,
        created_at: chrono::Utc::now().timestamp().to_string(),
        user_id: user_id.to_string(),
    }
}
