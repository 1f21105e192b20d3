//! Pin gallery command-line entry point: drop pins, collect nearby photos
//! and keep them in the local SQLite store.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use futures_util::future::join_all;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use pin_gallery::domain::ports::{Location, LocationId, Photo, PhotoId};
use pin_gallery::domain::{
    CollectionOutcome, Coordinate, MapRegion, PhotoCollectionPorts, PhotoCollectionService,
    PinService,
};
use pin_gallery::outbound::http::ReqwestPhotoTransport;
use pin_gallery::outbound::persistence::{
    DieselMapRegionRepository, DieselPhotoStore, SqliteDatabase,
};
use pin_gallery::settings::GallerySettings;

/// `pin-gallery` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "pin-gallery",
    about = "Drop map pins and keep a page of nearby photos for each",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List pins with their photo counts.
    Pins,
    /// Drop a pin and collect photos around it.
    Drop {
        /// Latitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Only create the pin.
        #[arg(long)]
        no_collect: bool,
    },
    /// Collect photos for an existing pin.
    Collect {
        /// Pin id.
        #[arg(long)]
        pin: i64,
        /// Replace the pin's current photos with a fresh page.
        #[arg(long)]
        renew: bool,
    },
    /// List a pin's photos.
    Photos {
        /// Pin id.
        #[arg(long)]
        pin: i64,
    },
    /// Download images still missing for a pin's photos.
    LoadImages {
        /// Pin id.
        #[arg(long)]
        pin: i64,
    },
    /// Delete selected photos.
    RemovePhotos {
        /// Photo ids, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
    },
    /// Delete a pin and its photos.
    RemovePin {
        /// Pin id.
        #[arg(long)]
        pin: i64,
    },
    /// Show or save the last visible map region.
    Region {
        #[command(subcommand)]
        action: RegionCommand,
    },
}

#[derive(Debug, Subcommand)]
enum RegionCommand {
    /// Print the saved region.
    Show,
    /// Save a region.
    Set {
        /// Center latitude.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Center longitude.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Visible latitude span.
        #[arg(long)]
        lat_delta: f64,
        /// Visible longitude span.
        #[arg(long)]
        lon_delta: f64,
    },
}

struct App {
    settings: GallerySettings,
    store: Arc<DieselPhotoStore>,
    pins: PinService,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let settings = GallerySettings::load_from_iter([OsString::from("pin-gallery")])
        .map_err(|error| eyre!("failed to load settings: {error}"))?;
    init_tracing(settings.log_json);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(args.command, settings))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(error) = result {
        warn!(%error, "tracing init failed");
    }
}

async fn run(command: Command, settings: GallerySettings) -> Result<()> {
    let database_path = settings.database_path();
    let database = SqliteDatabase::open(&database_path)
        .await
        .wrap_err_with(|| format!("failed to open {}", database_path.display()))?;
    let store = Arc::new(DieselPhotoStore::new(database.clone()));
    let regions = Arc::new(DieselMapRegionRepository::new(database));
    let app = App {
        pins: PinService::new(store.clone(), regions),
        store,
        settings,
    };

    match command {
        Command::Pins => app.list_pins().await,
        Command::Drop {
            lat,
            lon,
            no_collect,
        } => {
            let location = app.pins.drop_pin(Coordinate::new(lat, lon)).await?;
            out(format_args!("{}", format_location(&location)))?;
            if no_collect {
                return Ok(());
            }
            app.collect(location, false).await
        }
        Command::Collect { pin, renew } => {
            let location = app.pins.pin(LocationId(pin)).await?;
            app.collect(location, renew).await
        }
        Command::Photos { pin } => {
            for photo in app.pins.photos(LocationId(pin)).await? {
                out(format_args!("{}", format_photo(&photo)))?;
            }
            Ok(())
        }
        Command::LoadImages { pin } => {
            let service = app.collection_service()?;
            app.load_images(&service, LocationId(pin)).await
        }
        Command::RemovePhotos { ids } => {
            let ids: Vec<PhotoId> = ids.into_iter().map(PhotoId).collect();
            let removed = app.pins.remove_photos(&ids).await?;
            out(format_args!("Removed {removed} photos."))
        }
        Command::RemovePin { pin } => {
            app.pins.remove_pin(LocationId(pin)).await?;
            out(format_args!("Removed pin {pin}."))
        }
        Command::Region { action } => app.region(action).await,
    }
}

impl App {
    fn collection_service(&self) -> Result<Arc<PhotoCollectionService>> {
        let config = self.settings.photo_search_config()?;
        let transport = ReqwestPhotoTransport::new(self.settings.request_timeout())
            .wrap_err("failed to build HTTP client")?;
        Ok(Arc::new(PhotoCollectionService::new(
            PhotoCollectionPorts::new(Arc::new(transport), self.store.clone()),
            config,
        )))
    }

    async fn list_pins(&self) -> Result<()> {
        for location in self.pins.pins().await? {
            let count = self.pins.photos(location.id).await?.len();
            out(format_args!("{}\t{count} photos", format_location(&location)))?;
        }
        Ok(())
    }

    async fn collect(&self, location: Location, renew: bool) -> Result<()> {
        let service = self.collection_service()?;
        let outcome = if renew {
            service.renew_collection(&location).await?
        } else {
            service
                .spawn_collect(location)
                .await
                .wrap_err("photo collection task ended without an outcome")?
        };
        out(format_args!("{}", outcome.user_message()))?;

        match outcome {
            CollectionOutcome::Success { .. } => self.load_images(&service, location.id).await,
            CollectionOutcome::EmptyResult => Ok(()),
            CollectionOutcome::Failure(failure) => Err(eyre!(failure)),
        }
    }

    async fn load_images(
        &self,
        service: &Arc<PhotoCollectionService>,
        pin: LocationId,
    ) -> Result<()> {
        let pending: BTreeSet<String> = self
            .pins
            .photos(pin)
            .await?
            .into_iter()
            .filter(|photo| !photo.has_image())
            .map(|photo| photo.url)
            .collect();
        info!(location_id = %pin, urls = pending.len(), "loading images");

        let handles = pending
            .into_iter()
            .map(|url| service.spawn_image_fetch(url));
        for joined in join_all(handles).await {
            if let Err(error) = joined {
                warn!(%error, "image fetch task failed");
            }
        }

        let photos = self.pins.photos(pin).await?;
        let loaded = photos.iter().filter(|photo| photo.has_image()).count();
        out(format_args!("{loaded} of {} images loaded.", photos.len()))
    }

    async fn region(&self, action: RegionCommand) -> Result<()> {
        match action {
            RegionCommand::Show => match self.pins.last_region().await? {
                Some(region) => out(format_args!(
                    "{}\t{}\t{}",
                    region.center, region.latitude_delta, region.longitude_delta
                )),
                None => out(format_args!("No map region saved.")),
            },
            RegionCommand::Set {
                lat,
                lon,
                lat_delta,
                lon_delta,
            } => {
                self.pins
                    .remember_region(MapRegion {
                        center: Coordinate::new(lat, lon),
                        latitude_delta: lat_delta,
                        longitude_delta: lon_delta,
                    })
                    .await?;
                out(format_args!("Saved map region."))
            }
        }
    }
}

fn format_location(location: &Location) -> String {
    format!("{}\t{}", location.id, location.coordinate)
}

fn format_photo(photo: &Photo) -> String {
    let image = photo
        .image
        .as_ref()
        .map_or_else(|| "pending".to_owned(), |bytes| format!("{} bytes", bytes.len()));
    format!("{}\t{}\t{image}", photo.id, photo.url)
}

fn out(line: std::fmt::Arguments<'_>) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}").wrap_err("failed to write to stdout")
}
