use std::sync::Arc;

use moviefindr::{
    db,
    services::{
        CatalogClient, ListQuery, LocationService, NoDevice, NominatimGeocoder, PreferenceStore,
        ResultListController, TmdbClient, TrendingWindow,
    },
    Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moviefindr=info")),
        )
        .init();

    let config = Config::from_env()?;
    let store = db::open_store(&config).await?;

    let location = LocationService::new(
        Arc::clone(&store),
        Arc::new(NoDevice),
        Arc::new(NominatimGeocoder::new(
            config.geocode_url.clone(),
            config.geocode_user_agent.clone(),
        )),
        config.location_ttl(),
        config.fallback_country.clone(),
    );
    location.init_on_app_start().await;

    let catalog: Arc<dyn CatalogClient> = Arc::new(TmdbClient::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));

    let terms: Vec<String> = std::env::args().skip(1).collect();
    let query = match terms.first().map(String::as_str) {
        None => ListQuery::Popular,
        Some("--genres") => {
            for genre in catalog.movie_genres().await? {
                println!("{:>6}  {}", genre.id, genre.name);
            }
            return Ok(());
        }
        Some("--trending") => ListQuery::Trending(TrendingWindow::Week),
        Some("--top-rated") => ListQuery::TopRated,
        Some(_) => ListQuery::Search(terms.join(" ")),
    };

    let preferences = PreferenceStore::new(store);
    let mut list = ResultListController::new(catalog, preferences, location.country_code());

    list.select(query).await;
    list.resolve_providers().await;

    println!(
        "{} results (page {}/{}, providers for {})",
        list.visible_results().len(),
        list.current_page(),
        list.total_pages(),
        list.country()
    );
    for movie in list.visible_results() {
        let providers: Vec<String> = list
            .display_providers(movie.id)
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.provider_name)
            .collect();
        let rating = movie
            .vote_average
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>8}  {:<45} {:>4}  {}",
            movie.id,
            movie.title,
            rating,
            providers.join(", ")
        );
    }

    Ok(())
}
