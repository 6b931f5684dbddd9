//! Workbook export and import.
//!
//! A workbook is a zip archive holding one CSV file per sheet, named after
//! the sheet (`Clientes.csv`, `Juegos.csv`, ...). Imports are best effort:
//! rows that cannot be used are skipped and reported, the rest are stored.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::entities::{event, release, ReservationStatus};
use crate::errors::ServiceError;
use crate::repositories::{
    ClientRepository, CrudRepository, EventRepository, PaletteRepository,
    ReleaseRepository, ReservationRepository, StaffRepository,
};
use crate::services::clients::{ClientInput, ClientService};
use crate::services::colors::{GamePalette, Palette};
use crate::services::events::EventInput;
use crate::services::palette::{checked_color, dedupe};
use crate::services::releases::ReleaseInput;
use crate::services::reservations::{build_reservation, Catalog, Product, ProductKind, ReservationInput};
use crate::services::staff::StaffInput;

pub const WORKBOOK_FILE_NAME: &str = "export_gestion_lanzamientos.zip";
pub const WORKBOOK_CONTENT_TYPE: &str = "application/zip";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Sheet {
    Juegos,
    Colecciones,
    Clientes,
    Eventos,
    Lanzamientos,
    Reservas,
    Staff,
}

impl Sheet {
    /// Sheets in workbook order
    pub const ALL: [Sheet; 7] = [
        Sheet::Juegos,
        Sheet::Colecciones,
        Sheet::Clientes,
        Sheet::Eventos,
        Sheet::Lanzamientos,
        Sheet::Reservas,
        Sheet::Staff,
    ];

    pub fn file_name(self) -> String {
        format!("{}.csv", self)
    }

    fn headers(self) -> &'static [&'static str] {
        match self {
            Sheet::Juegos => &["Juego", "Color"],
            Sheet::Colecciones => &["Coleccion", "Juego"],
            Sheet::Clientes => &["nombre", "email", "telefono"],
            Sheet::Eventos => &[
                "nombre",
                "juego",
                "coleccion",
                "fecha",
                "precio",
                "precio_reserva",
                "comentario",
            ],
            Sheet::Lanzamientos => &[
                "nombre",
                "juego",
                "coleccion",
                "fecha_salida",
                "fecha_envio",
                "precio",
                "precio_reserva",
                "comentario",
            ],
            Sheet::Reservas => &[
                "telefono_cliente",
                "tipo",
                "nombre",
                "juego",
                "coleccion",
                "cantidad",
                "fecha_reserva",
                "estado",
                "pagado",
                "tipo_pago",
                "notas",
            ],
            Sheet::Staff => &["nombre", "rol", "email", "telefono"],
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImportMode {
    /// Empty the target first
    #[default]
    Overwrite,
    Append,
}

/// An uploaded workbook and what to do with it
#[derive(Debug, Clone, Default)]
pub struct WorkbookUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
    pub sheet_name: Option<String>,
    pub mode: ImportMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub sheet: Sheet,
    pub mode: ImportMode,
    pub imported: usize,
    pub skipped: usize,
    pub messages: Vec<String>,
}

impl ImportReport {
    fn new(sheet: Sheet, mode: ImportMode) -> Self {
        Self {
            sheet,
            mode,
            imported: 0,
            skipped: 0,
            messages: Vec::new(),
        }
    }

    fn skip(&mut self, message: String) {
        warn!(sheet = %self.sheet, %message, "import row skipped");
        self.skipped += 1;
        self.messages.push(message);
    }

    fn skip_rows(&mut self, rejected: Vec<(usize, String)>) {
        for (row, message) in rejected {
            self.skip(format!("Fila {}: {}", row, message));
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Datos de la hoja \"{}\" importados correctamente en modo \"{}\".",
            self.sheet, self.mode
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRow {
    #[serde(rename = "Juego", default)]
    pub game: Option<String>,
    #[serde(rename = "Color", default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionRow {
    #[serde(rename = "Coleccion", default)]
    pub collection: Option<String>,
    #[serde(rename = "Juego", default)]
    pub game: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClientRow {
    #[serde(rename = "nombre", default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(rename = "telefono", default)]
    phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StaffRow {
    #[serde(rename = "nombre", default)]
    name: Option<String>,
    #[serde(rename = "rol", default)]
    role: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(rename = "telefono", default)]
    phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRow {
    #[serde(rename = "nombre", default)]
    name: Option<String>,
    #[serde(rename = "juego", default)]
    game: Option<String>,
    #[serde(rename = "coleccion", default)]
    collection: Option<String>,
    #[serde(rename = "fecha")]
    date: NaiveDate,
    #[serde(rename = "precio", default)]
    price: Option<Decimal>,
    #[serde(rename = "precio_reserva", default)]
    reservation_fee: Option<Decimal>,
    #[serde(rename = "comentario", default)]
    comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReleaseRow {
    #[serde(rename = "nombre", default)]
    name: Option<String>,
    #[serde(rename = "juego", default)]
    game: Option<String>,
    #[serde(rename = "coleccion", default)]
    collection: Option<String>,
    #[serde(rename = "fecha_salida")]
    release_date: NaiveDate,
    #[serde(rename = "fecha_envio", default)]
    ship_date: Option<NaiveDate>,
    #[serde(rename = "precio", default)]
    price: Option<Decimal>,
    #[serde(rename = "precio_reserva", default)]
    reservation_fee: Option<Decimal>,
    #[serde(rename = "comentario", default)]
    comment: Option<String>,
}

/// A reservation as it appears in the workbook: the client is named by
/// phone and the product by kind, name, game and collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ReservationSheetRow {
    #[serde(rename = "telefono_cliente", default)]
    client_phone: Option<String>,
    #[serde(rename = "tipo", default)]
    kind: Option<String>,
    #[serde(rename = "nombre", default)]
    name: Option<String>,
    #[serde(rename = "juego", default)]
    game: Option<String>,
    #[serde(rename = "coleccion", default)]
    collection: Option<String>,
    #[serde(rename = "cantidad", default)]
    quantity: Option<i32>,
    #[serde(rename = "fecha_reserva", default)]
    reservation_date: Option<NaiveDate>,
    #[serde(rename = "estado", default)]
    status: Option<String>,
    #[serde(rename = "pagado", default)]
    amount_paid: Option<Decimal>,
    #[serde(rename = "tipo_pago", default)]
    payment_type: Option<String>,
    #[serde(rename = "notas", default)]
    notes: Option<String>,
}

impl From<ClientRow> for ClientInput {
    fn from(row: ClientRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            email: row.email,
            phone: row.phone,
        }
    }
}

impl From<StaffRow> for StaffInput {
    fn from(row: StaffRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            role: row.role,
            email: row.email,
            phone: row.phone,
        }
    }
}

impl From<EventRow> for EventInput {
    fn from(row: EventRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            game: row.game,
            collection: row.collection,
            date: row.date,
            price: row.price,
            reservation_fee: row.reservation_fee,
            comment: row.comment,
        }
    }
}

impl From<ReleaseRow> for ReleaseInput {
    fn from(row: ReleaseRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            game: row.game,
            collection: row.collection,
            release_date: row.release_date,
            ship_date: row.ship_date,
            price: row.price,
            reservation_fee: row.reservation_fee,
            comment: row.comment,
        }
    }
}

impl From<&event::Model> for EventRow {
    fn from(e: &event::Model) -> Self {
        Self {
            name: Some(e.name.clone()),
            game: e.game.clone(),
            collection: e.collection.clone(),
            date: e.date,
            price: Some(e.price),
            reservation_fee: Some(e.reservation_fee),
            comment: e.comment.clone(),
        }
    }
}

impl From<&release::Model> for ReleaseRow {
    fn from(r: &release::Model) -> Self {
        Self {
            name: Some(r.name.clone()),
            game: r.game.clone(),
            collection: r.collection.clone(),
            release_date: r.release_date,
            ship_date: r.ship_date,
            price: Some(r.price),
            reservation_fee: Some(r.reservation_fee),
            comment: r.comment.clone(),
        }
    }
}

/// Serializes `rows` under `sheet`'s header line. The header is written even
/// when there are no rows.
fn write_sheet<T: Serialize>(sheet: Sheet, rows: &[T]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(sheet.headers())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ServiceError::SerializationError(e.to_string()))
}

/// Parses every data row of a sheet. Each entry carries its spreadsheet row
/// number, counting the header as row 1.
fn read_sheet<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<(usize, Result<T, String>)>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 2;
        let parsed = record
            .and_then(|record| record.deserialize::<T>(Some(&headers)))
            .map_err(|e| e.to_string());
        rows.push((row, parsed));
    }
    Ok(rows)
}

/// Packs sheets into a zip archive
pub fn write_workbook(sheets: Vec<(Sheet, Vec<u8>)>) -> Result<Vec<u8>, ServiceError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

    for (sheet, bytes) in sheets {
        zip.start_file(sheet.file_name(), options)?;
        zip.write_all(&bytes)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Raw CSV of one sheet, or `None` when the workbook does not contain it
fn read_workbook_sheet(bytes: &[u8], sheet_name: &str) -> Result<Option<Vec<u8>>, ServiceError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let file_name = format!("{}.csv", sheet_name);
    if !archive.file_names().any(|name| name == file_name) {
        return Ok(None);
    }

    let mut file = archive.by_name(&file_name)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
    Ok(Some(contents))
}

/// Palette holding exactly the listed games, with no collections. Rows
/// without a game are ignored; rows with a bad colour are rejected.
pub fn palette_from_game_rows(rows: Vec<(usize, GameRow)>) -> (Palette, Vec<(usize, String)>) {
    let mut games = Vec::new();
    let mut rejected = Vec::new();
    for (row, entry) in rows {
        let Some(name) = entry.game.filter(|g| !g.trim().is_empty()) else {
            continue;
        };
        match checked_color(entry.color.as_deref().unwrap_or("")) {
            Ok(color) => games.push(GamePalette {
                name,
                color,
                collections: Vec::new(),
            }),
            Err(err) => rejected.push((row, err.response_message())),
        }
    }
    (dedupe(Palette::new(games)), rejected)
}

/// Joins collection rows onto the games of `palette`, appending each unseen
/// collection to its game in row order. Rows naming an unknown game are
/// rejected. Returns the joined palette, how many collections were added,
/// and the rejections.
pub fn join_collections(
    mut palette: Palette,
    rows: Vec<(usize, CollectionRow)>,
) -> (Palette, usize, Vec<(usize, String)>) {
    let mut added = 0;
    let mut rejected = Vec::new();

    for (row, entry) in rows {
        let game = entry.game.map(|g| g.trim().to_string()).unwrap_or_default();
        let collection = entry
            .collection
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if game.is_empty() || collection.is_empty() {
            rejected.push((row, "Falta el juego o la colección.".to_string()));
            continue;
        }

        match palette.games.iter_mut().find(|g| g.name == game) {
            Some(entry) => {
                if !entry.collections.contains(&collection) {
                    entry.collections.push(collection);
                    added += 1;
                }
            }
            None => rejected.push((
                row,
                format!("Juego '{}' no encontrado. Saltando colección '{}'.", game, collection),
            )),
        }
    }

    (palette, added, rejected)
}

fn palette_rows(palette: &Palette) -> (Vec<GameRow>, Vec<CollectionRow>) {
    let games = palette
        .games
        .iter()
        .map(|g| GameRow {
            game: Some(g.name.clone()),
            color: Some(g.color.clone()),
        })
        .collect();
    let collections = palette
        .games
        .iter()
        .flat_map(|g| {
            g.collections.iter().map(|c| CollectionRow {
                collection: Some(c.clone()),
                game: Some(g.name.clone()),
            })
        })
        .collect();
    (games, collections)
}

/// Splits parsed rows into usable ones and `(row, message)` rejections
fn partition<T>(rows: Vec<(usize, Result<T, String>)>) -> (Vec<(usize, T)>, Vec<(usize, String)>) {
    let mut ok = Vec::new();
    let mut rejected = Vec::new();
    for (row, parsed) in rows {
        match parsed {
            Ok(value) => ok.push((row, value)),
            Err(message) => rejected.push((row, message)),
        }
    }
    (ok, rejected)
}

/// Converts each row with `build`, collecting models and rejections
fn build_models<T, M>(
    rows: Vec<(usize, T)>,
    build: impl Fn(T) -> Result<M, ServiceError>,
) -> (Vec<M>, Vec<(usize, String)>) {
    let mut models = Vec::new();
    let mut rejected = Vec::new();
    for (row, value) in rows {
        match build(value) {
            Ok(model) => models.push(model),
            Err(err) => rejected.push((row, err.response_message())),
        }
    }
    (models, rejected)
}

#[derive(Clone)]
pub struct TransferService {
    clients: ClientRepository,
    client_rules: ClientService,
    releases: ReleaseRepository,
    events: EventRepository,
    reservations: ReservationRepository,
    staff: StaffRepository,
    palette: PaletteRepository,
}

impl TransferService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            clients: ClientRepository::new(db.clone()),
            client_rules: ClientService::new(db.clone()),
            releases: ReleaseRepository::new(db.clone()),
            events: EventRepository::new(db.clone()),
            reservations: ReservationRepository::new(db.clone()),
            staff: StaffRepository::new(db.clone()),
            palette: PaletteRepository::new(db),
        }
    }

    /// Every table as one workbook
    #[instrument(skip(self))]
    pub async fn export(&self) -> Result<Vec<u8>, ServiceError> {
        let palette = self.palette.load().await?;
        let (game_rows, collection_rows) = palette_rows(&palette);

        let clients = self.clients.list().await?;
        let releases = self.releases.list().await?;
        let events = self.events.list().await?;
        let staff = self.staff.list().await?;

        let client_rows: Vec<ClientRow> = clients
            .iter()
            .map(|c| ClientRow {
                name: Some(c.name.clone()),
                email: c.email.clone(),
                phone: c.phone.clone(),
            })
            .collect();
        let staff_rows: Vec<StaffRow> = staff
            .iter()
            .map(|s| StaffRow {
                name: Some(s.name.clone()),
                role: s.role.clone(),
                email: s.email.clone(),
                phone: s.phone.clone(),
            })
            .collect();
        let event_rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
        let release_rows: Vec<ReleaseRow> = releases.iter().map(ReleaseRow::from).collect();

        let catalog = Catalog {
            clients: clients.into_iter().map(|c| (c.id, c)).collect(),
            releases: releases.into_iter().map(|r| (r.id, r)).collect(),
            events: events.into_iter().map(|e| (e.id, e)).collect(),
        };
        let reservation_rows: Vec<ReservationSheetRow> = self
            .reservations
            .list()
            .await?
            .iter()
            .map(|r| {
                let product = catalog.product_of(r);
                ReservationSheetRow {
                    client_phone: Some(
                        catalog
                            .clients
                            .get(&r.client_id)
                            .and_then(|c| c.phone.clone())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    kind: product.as_ref().map(|p| p.kind().label().to_string()),
                    name: product.as_ref().map(|p| p.name().to_string()),
                    game: product.as_ref().and_then(|p| p.game().map(str::to_string)),
                    collection: product
                        .as_ref()
                        .and_then(|p| p.collection().map(str::to_string)),
                    quantity: Some(r.quantity),
                    reservation_date: Some(r.reservation_date),
                    status: Some(r.status.to_string()),
                    amount_paid: Some(r.amount_paid),
                    payment_type: r.payment_type.clone(),
                    notes: r.notes.clone(),
                }
            })
            .collect();

        let workbook = write_workbook(vec![
            (Sheet::Juegos, write_sheet(Sheet::Juegos, &game_rows)?),
            (Sheet::Colecciones, write_sheet(Sheet::Colecciones, &collection_rows)?),
            (Sheet::Clientes, write_sheet(Sheet::Clientes, &client_rows)?),
            (Sheet::Eventos, write_sheet(Sheet::Eventos, &event_rows)?),
            (Sheet::Lanzamientos, write_sheet(Sheet::Lanzamientos, &release_rows)?),
            (Sheet::Reservas, write_sheet(Sheet::Reservas, &reservation_rows)?),
            (Sheet::Staff, write_sheet(Sheet::Staff, &staff_rows)?),
        ])?;

        info!(bytes = workbook.len(), "workbook exported");
        Ok(workbook)
    }

    /// Imports one sheet of an uploaded workbook
    #[instrument(skip(self, upload), fields(file = ?upload.file_name, sheet = ?upload.sheet_name, mode = %upload.mode))]
    pub async fn import(&self, upload: WorkbookUpload) -> Result<ImportReport, ServiceError> {
        let file_name = upload
            .file_name
            .as_deref()
            .filter(|name| !name.is_empty() && !upload.bytes.is_empty())
            .ok_or_else(|| {
                ServiceError::BadRequest("No se ha seleccionado ningún fichero.".to_string())
            })?;
        if !file_name.to_ascii_lowercase().ends_with(".zip") {
            return Err(ServiceError::BadRequest(
                "Formato de fichero no válido. Por favor, sube un fichero .zip.".to_string(),
            ));
        }
        let sheet_name = upload
            .sheet_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ServiceError::BadRequest("No se ha especificado qué hoja importar.".to_string())
            })?;

        let bytes = read_workbook_sheet(&upload.bytes, sheet_name)?.ok_or_else(|| {
            ServiceError::BadRequest(format!("La hoja '{}' no existe en el fichero.", sheet_name))
        })?;
        let sheet = Sheet::from_str(sheet_name).map_err(|_| {
            ServiceError::BadRequest(format!(
                "La importación para la hoja '{}' no está implementada.",
                sheet_name
            ))
        })?;

        let mut report = ImportReport::new(sheet, upload.mode);
        let overwrite = upload.mode == ImportMode::Overwrite;

        match sheet {
            Sheet::Juegos => self.import_games(&bytes, overwrite, &mut report).await?,
            Sheet::Colecciones => self.import_collections(&bytes, overwrite, &mut report).await?,
            Sheet::Clientes => {
                let (rows, rejected) = partition(read_sheet::<ClientRow>(&bytes)?);
                report.skip_rows(rejected);
                let rows = rows.into_iter().map(|(n, r)| (n, ClientInput::from(r))).collect();
                let (models, rejected) = self.client_rules.prepare_import(rows, !overwrite).await?;
                report.skip_rows(rejected);
                report.imported = store(&self.clients, models, overwrite).await?;
            }
            Sheet::Eventos => {
                let (rows, rejected) = partition(read_sheet::<EventRow>(&bytes)?);
                report.skip_rows(rejected);
                let (models, rejected) =
                    build_models(rows, |row| EventInput::from(row).into_active_model());
                report.skip_rows(rejected);
                report.imported = store(&self.events, models, overwrite).await?;
            }
            Sheet::Lanzamientos => {
                let (rows, rejected) = partition(read_sheet::<ReleaseRow>(&bytes)?);
                report.skip_rows(rejected);
                let (models, rejected) =
                    build_models(rows, |row| ReleaseInput::from(row).into_active_model());
                report.skip_rows(rejected);
                report.imported = store(&self.releases, models, overwrite).await?;
            }
            Sheet::Staff => {
                let (rows, rejected) = partition(read_sheet::<StaffRow>(&bytes)?);
                report.skip_rows(rejected);
                let (models, rejected) =
                    build_models(rows, |row| StaffInput::from(row).into_active_model());
                report.skip_rows(rejected);
                report.imported = store(&self.staff, models, overwrite).await?;
            }
            Sheet::Reservas => self.import_reservations(&bytes, overwrite, &mut report).await?,
        }

        info!(
            sheet = %sheet,
            imported = report.imported,
            skipped = report.skipped,
            "workbook sheet imported"
        );
        Ok(report)
    }

    async fn import_games(
        &self,
        bytes: &[u8],
        overwrite: bool,
        report: &mut ImportReport,
    ) -> Result<(), ServiceError> {
        let (rows, rejected) = partition(read_sheet::<GameRow>(bytes)?);
        report.skip_rows(rejected);

        if overwrite {
            let (palette, rejected) = palette_from_game_rows(rows);
            report.skip_rows(rejected);
            self.palette.replace(&palette).await?;
            report.imported = palette.games.len();
            return Ok(());
        }

        for (row, entry) in rows {
            let Some(name) = entry.game.filter(|g| !g.is_empty()) else {
                continue;
            };
            let color = match entry.color.filter(|c| !c.is_empty()) {
                Some(color) => color,
                // a blank colour keeps the stored one
                None => match self.palette.find_game(&name).await? {
                    Some(existing) => existing.color,
                    None => String::new(),
                },
            };
            match checked_color(&color) {
                Ok(color) => {
                    self.palette.upsert_game(&name, &color).await?;
                    report.imported += 1;
                }
                Err(err) => report.skip(format!("Fila {}: {}", row, err.response_message())),
            }
        }
        Ok(())
    }

    async fn import_collections(
        &self,
        bytes: &[u8],
        overwrite: bool,
        report: &mut ImportReport,
    ) -> Result<(), ServiceError> {
        if overwrite {
            return Err(ServiceError::BadRequest(
                "Para sobrescribir colecciones, por favor, sobrescriba la hoja \"Juegos\" y luego añada las colecciones."
                    .to_string(),
            ));
        }

        let (rows, rejected) = partition(read_sheet::<CollectionRow>(bytes)?);
        report.skip_rows(rejected);

        let (palette, added, rejected) = join_collections(self.palette.load().await?, rows);
        report.skip_rows(rejected);
        self.palette.replace(&palette).await?;
        report.imported = added;
        Ok(())
    }

    async fn import_reservations(
        &self,
        bytes: &[u8],
        overwrite: bool,
        report: &mut ImportReport,
    ) -> Result<(), ServiceError> {
        let (rows, rejected) = partition(read_sheet::<ReservationSheetRow>(bytes)?);
        report.skip_rows(rejected);

        let mut models = Vec::new();
        for (row, entry) in rows {
            let phone = entry.client_phone.clone().unwrap_or_default();
            let Some(client) = self.clients.find_by_phone(phone.trim()).await? else {
                report.skip(format!(
                    "Cliente con teléfono {} no encontrado. Saltando reserva.",
                    phone
                ));
                continue;
            };
            let client_id = client.id;

            let name = entry.name.as_deref().unwrap_or("");
            let game = entry.game.as_deref();
            let collection = entry.collection.as_deref();
            let kind = entry
                .kind
                .as_deref()
                .and_then(|k| ProductKind::from_str(k).ok())
                .unwrap_or(ProductKind::Release);
            let product = match kind {
                ProductKind::Release => self
                    .releases
                    .find_by_identity(name, game, collection)
                    .await?
                    .map(Product::Release),
                ProductKind::Event => self
                    .events
                    .find_by_identity(name, game, collection)
                    .await?
                    .map(Product::Event),
            };
            let Some(product) = product else {
                report.skip(format!(
                    "Producto no encontrado para la reserva: ({}, {}, {}). Saltando.",
                    name,
                    game.unwrap_or(""),
                    collection.unwrap_or("")
                ));
                continue;
            };

            let input = ReservationInput {
                client_id,
                quantity: entry.quantity,
                reservation_date: entry.reservation_date,
                status: entry
                    .status
                    .as_deref()
                    .and_then(|s| ReservationStatus::from_str(s).ok()),
                amount_paid: entry.amount_paid,
                payment_type: entry.payment_type,
                notes: entry.notes,
                ..Default::default()
            };
            match build_reservation(client_id, &product, input) {
                Ok(model) => models.push(model),
                Err(err) => report.skip(format!("Fila {}: {}", row, err.response_message())),
            }
        }

        report.imported = store(&self.reservations, models, overwrite).await?;
        Ok(())
    }
}

/// Inserts `models`, emptying the table first when overwriting
async fn store<R: CrudRepository>(
    repository: &R,
    models: Vec<R::ActiveModel>,
    overwrite: bool,
) -> Result<usize, ServiceError> {
    if overwrite {
        repository.replace_all(models).await
    } else {
        repository.insert_all(models).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_rows(rows: &[(&str, &str)]) -> Vec<(usize, GameRow)> {
        rows.iter()
            .enumerate()
            .map(|(i, (game, color))| {
                (
                    i + 2,
                    GameRow {
                        game: Some(game.to_string()),
                        color: Some(color.to_string()),
                    },
                )
            })
            .collect()
    }

    fn collection_rows(rows: &[(&str, &str)]) -> Vec<(usize, CollectionRow)> {
        rows.iter()
            .enumerate()
            .map(|(i, (collection, game))| {
                (
                    i + 2,
                    CollectionRow {
                        collection: Some(collection.to_string()),
                        game: Some(game.to_string()),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn games_and_collections_join_back_into_palette() {
        let (palette, rejected) =
            palette_from_game_rows(game_rows(&[("Lorcana", "#3366CC"), ("Avatar", "#ff9900")]));
        assert!(rejected.is_empty());

        let (palette, added, rejected) = join_collections(
            palette,
            collection_rows(&[
                ("Primer Capítulo", "Lorcana"),
                ("Marea", "Lorcana"),
                ("Primer Capítulo", "Lorcana"),
                ("Suelta", "Pokémon"),
            ]),
        );

        assert_eq!(added, 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, 5);
        assert!(rejected[0].1.contains("Pokémon"));

        let lorcana = palette.game("Lorcana").unwrap();
        assert_eq!(lorcana.color, "#3366cc");
        assert_eq!(lorcana.collections, vec!["Primer Capítulo", "Marea"]);
        assert!(palette.game("Avatar").unwrap().collections.is_empty());
    }

    #[test]
    fn bad_colours_are_rejected_by_row() {
        let (palette, rejected) =
            palette_from_game_rows(game_rows(&[("Lorcana", "azul"), ("", "#000000")]));
        assert!(palette.games.is_empty());
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, 2);
    }

    #[test]
    fn sheets_keep_headers_when_empty() {
        let bytes = write_sheet::<StaffRow>(Sheet::Staff, &[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "nombre,rol,email,telefono\n");
    }

    #[test]
    fn rows_that_do_not_parse_are_numbered() {
        let csv = "nombre,juego,coleccion,fecha_salida,fecha_envio,precio,precio_reserva,comentario\n\
                   Bundle,Lorcana,,2025-09-26,,49.95,5,\n\
                   Sin fecha,Lorcana,,,,10,0,\n";
        let rows = read_sheet::<ReleaseRow>(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let (ok, rejected) = partition(rows);
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].1.name.as_deref(), Some("Bundle"));
        assert_eq!(ok[0].1.collection, None);
        assert_eq!(ok[0].1.ship_date, None);
        assert_eq!(rejected[0].0, 3);
    }

    #[test]
    fn workbook_sheets_can_be_read_back() {
        let games = write_sheet(
            Sheet::Juegos,
            &[GameRow {
                game: Some("Lorcana".into()),
                color: Some("#3366cc".into()),
            }],
        )
        .unwrap();
        let workbook = write_workbook(vec![(Sheet::Juegos, games.clone())]).unwrap();

        assert_eq!(read_workbook_sheet(&workbook, "Juegos").unwrap(), Some(games));
        assert_eq!(read_workbook_sheet(&workbook, "Clientes").unwrap(), None);
    }

    #[test]
    fn unreadable_archives_are_invalid_input() {
        let result = read_workbook_sheet(b"not a zip", "Juegos");
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn sheet_names_and_modes_parse() {
        assert_eq!(Sheet::from_str("Reservas").unwrap(), Sheet::Reservas);
        assert_eq!(Sheet::from_str("staff").unwrap(), Sheet::Staff);
        assert!(Sheet::from_str("Facturas").is_err());
        assert_eq!(ImportMode::from_str("APPEND").unwrap(), ImportMode::Append);
        assert_eq!(ImportMode::default(), ImportMode::Overwrite);
        assert_eq!(Sheet::Lanzamientos.file_name(), "Lanzamientos.csv");
    }
}
