use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use songsmith::application::ports::{AudioClient, JobStore, Ledger, LyricsClient};
use songsmith::application::services::{
    AudioWorker, CallbackReconciler, LyricsWorker, SongService, StatusService,
};
use songsmith::infrastructure::generation::{HttpAudioClient, OpenAiLyricsClient};
use songsmith::infrastructure::observability::{TracingConfig, init_tracing};
use songsmith::infrastructure::persistence::{PgStore, create_pool};
use songsmith::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(
        TracingConfig {
            environment: settings.environment.to_string(),
            json_format: settings.logging.json_format,
        },
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    sqlx::migrate!().run(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let job_store: Arc<dyn JobStore> = store.clone();
    let ledger: Arc<dyn Ledger> = store;

    let lyrics_client: Arc<dyn LyricsClient> = Arc::new(OpenAiLyricsClient::new(
        &settings.lyrics.base_url,
        &settings.lyrics.api_key,
        &settings.lyrics.model,
        Duration::from_secs(settings.lyrics.timeout_secs),
    )?);
    let audio_client: Arc<dyn AudioClient> = Arc::new(HttpAudioClient::new(
        &settings.audio.base_url,
        &settings.audio.api_key,
        Duration::from_secs(settings.audio.timeout_secs),
    )?);

    let price = settings.pricing.song_credits;
    let songs = Arc::new(SongService::new(job_store.clone(), ledger, price));
    let status = Arc::new(StatusService::new(job_store.clone()));
    let lyrics_worker = Arc::new(LyricsWorker::new(job_store.clone(), lyrics_client));
    let audio_worker = Arc::new(AudioWorker::new(
        job_store.clone(),
        audio_client,
        price,
        settings.server.public_base_url.clone(),
    ));
    let reconciler = Arc::new(CallbackReconciler::new(job_store, price));

    // Built-in periodic triggers. An external scheduler hitting the
    // /internal/dequeue endpoints may run alongside; overlapping
    // invocations coordinate through the store's atomic claim.
    let period = Duration::from_secs(settings.dequeue.interval_secs);
    tokio::spawn(lyrics_ticker(Arc::clone(&lyrics_worker), period));
    tokio::spawn(audio_ticker(Arc::clone(&audio_worker), period));

    let state = AppState {
        songs,
        status,
        lyrics_worker,
        audio_worker,
        reconciler,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

async fn lyrics_ticker(worker: Arc<LyricsWorker>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(e) = worker.run_once().await {
            tracing::error!(error = %e, "Lyrics dequeue failed");
        }
    }
}

async fn audio_ticker(worker: Arc<AudioWorker>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(e) = worker.run_once().await {
            tracing::error!(error = %e, "Audio dequeue failed");
        }
    }
}
