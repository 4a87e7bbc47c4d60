//! Command-line front end for the product guide.
//!
//! Usage:
//!     guia rank --catalog produtos.json --problema sujeira_leve --area externo
//!     guia rank --select "problema=sujeira_leve&area=externo" --format json
//!     guia tags --category area
//!     guia link --problema sujeira_leve,sujeira_pesada

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use guia_catalog::{load_products, CatalogConfig, JsonCatalog};
use guia_explain::{criteria_count_label, results_count_label, summarize};
use guia_model::{Category, Product, Selection};
use guia_query::{decode_selection, ranking_link};
use guia_rank::{
    category_tag_options, format_tag_label, get_unique_tags, rank_products_with, RankConfig,
    RankingResult, ResultFilter, TagOptions,
};

#[derive(Parser)]
#[command(name = "guia")]
#[command(about = "Rank catalog products against a selection of criteria")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CatalogArgs {
    /// Path to the catalog JSON export
    #[arg(long, env = "GUIA_CATALOG", default_value = "data/produtos.json")]
    catalog: PathBuf,

    /// Sheet holding the product rows
    #[arg(long, default_value = "produtos")]
    sheet: String,
}

#[derive(Args)]
struct SelectionArgs {
    /// Selection as a query string, e.g. "problema=a,b&area=c"
    #[arg(long)]
    select: Option<String>,

    /// Problem tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    problema: Vec<String>,

    /// Area tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    area: Vec<String>,

    /// Material tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    material: Vec<String>,

    /// Step tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    etapa: Vec<String>,

    /// Intensity tags (comma-separated)
    #[arg(long, value_delimiter = ',')]
    intensidade: Vec<String>,
}

impl SelectionArgs {
    fn to_selection(&self) -> Result<Selection> {
        let mut selection = match &self.select {
            Some(query) => decode_selection(query)?,
            None => Selection::new(),
        };

        let flags = [
            (Category::Problema, &self.problema),
            (Category::Area, &self.area),
            (Category::Material, &self.material),
            (Category::Etapa, &self.etapa),
            (Category::Intensidade, &self.intensidade),
        ];
        for (category, tags) in flags {
            for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                selection.add(category, tag);
            }
        }

        Ok(selection)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank products for a selection
    Rank {
        #[command(flatten)]
        catalog: CatalogArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Only show high-compatibility results
        #[arg(long)]
        high_score_only: bool,

        /// Filter by name, brand or description
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the selectable tags of the catalog
    Tags {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Only list this category
        #[arg(short, long)]
        category: Option<Category>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the ranking page link for a selection
    Link {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("guia=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            catalog,
            selection,
            high_score_only,
            search,
            limit,
            format,
        } => {
            let selection = selection.to_selection()?;
            run_rank(&catalog, &selection, high_score_only, search, limit, format)?;
        }
        Commands::Tags {
            catalog,
            category,
            format,
        } => {
            run_tags(&catalog, category, format)?;
        }
        Commands::Link { selection } => {
            println!("{}", ranking_link(&selection.to_selection()?));
        }
    }

    Ok(())
}

fn load_catalog(args: &CatalogArgs) -> Result<Vec<Product>> {
    let source = JsonCatalog::new(CatalogConfig {
        path: args.catalog.clone(),
        sheet: args.sheet.clone(),
    });
    Ok(load_products(&source)?)
}

fn run_rank(
    catalog: &CatalogArgs,
    selection: &Selection,
    high_score_only: bool,
    search: Option<String>,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let products = load_catalog(catalog)?;
    let config = RankConfig::default();

    let result = rank_products_with(&products, selection, &config);
    let max_possible_score = result.max_possible_score;

    let mut filter = ResultFilter::new();
    if high_score_only {
        filter = filter.with_high_score_only(&config);
    }
    if let Some(query) = search {
        filter = filter.with_search(query);
    }

    let mut hits = filter.apply(result.ranked_products);
    if let Some(limit) = limit {
        hits.truncate(limit);
    }

    if let OutputFormat::Json = format {
        let output = RankingResult {
            ranked_products: hits,
            max_possible_score,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Ranking de Produtos: {} ({})",
        results_count_label(hits.len()),
        criteria_count_label(selection.total_selected())
    );
    if selection.is_empty() {
        println!("Selecione critérios para ranquear os produtos.");
    }
    println!("---");

    for (i, hit) in hits.iter().enumerate() {
        let product = &hit.product;
        println!("\n{}. {} [{}] (id {})", i + 1, product.name, product.brand, product.id);
        if !product.short_description.is_empty() {
            println!("   {}", product.short_description);
        }
        println!("   {}", summarize(hit));
    }

    Ok(())
}

fn run_tags(catalog: &CatalogArgs, category: Option<Category>, format: OutputFormat) -> Result<()> {
    let products = load_catalog(catalog)?;

    let options = match category {
        Some(category) => vec![TagOptions {
            category,
            tags: get_unique_tags(&products, category),
        }],
        None => category_tag_options(&products),
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    for option in &options {
        let category = option.category;
        println!(
            "{} {} (peso {}, {} tags)",
            category.icon(),
            category.label(),
            category.weight(),
            option.tags.len()
        );
        for tag in &option.tags {
            println!("   {:<32} {}", tag, format_tag_label(tag));
        }
    }

    Ok(())
}
