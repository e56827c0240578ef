// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Storefront CLI
//!
//! Drives the page managers from a terminal, against fixtures or the live
//! backend. The session (identity token) is kept in a JSON file so that
//! `session login` carries over to later invocations.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use storefront::{
	AddOutcome, Availability, LogNotifier, OrderFilter, PaymentForm, Storefront, UpdateOutcome,
	checkout::{CheckoutReadiness, format_card_number},
	logging::init_logging,
	orders::tracking,
};
use storefront_gateway::{
	FileSessionStore, SessionStore, StorefrontConfig, session::ID_TOKEN_KEY,
};
use storefront_sdk::{Cart, ShippingDetails};
use tracing::info;

/// Storefront client: cart, checkout and orders from the terminal
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
	/// Configuration file (TOML, YAML or JSON)
	#[arg(long, global = true, env = "STOREFRONT_CONFIG")]
	config: Option<String>,

	/// Serve every call from fixtures
	#[arg(long, global = true, conflicts_with = "real")]
	mock: bool,

	/// Call the live backend
	#[arg(long, global = true)]
	real: bool,

	/// Session file holding the identity token
	#[arg(
		long,
		global = true,
		env = "STOREFRONT_SESSION_FILE",
		default_value = ".storefront/session.json"
	)]
	session_file: String,

	/// Also log to stderr
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Show stock levels
	Products {
		/// Only these products
		ids: Vec<String>,
	},

	/// Manage the cart
	#[command(subcommand)]
	Cart(CartCommands),

	/// Order history
	Orders(OrdersArgs),

	/// Place an order for the current cart
	Checkout(CheckoutArgs),

	/// Manage the local session
	#[command(subcommand)]
	Session(SessionCommands),

	/// Print hosted-UI sign-in and sign-up links
	Links,
}

#[derive(Subcommand)]
enum CartCommands {
	/// Show the cart
	Show,
	/// Add a product
	Add { product_id: String, weight_grams: u32 },
	/// Change the weight of a cart line
	Update { product_id: String, weight_grams: u32 },
	/// Remove a cart line
	Remove { product_id: String },
	/// Empty the cart
	Clear,
}

#[derive(Args)]
struct OrdersArgs {
	/// Only orders with this status code (e.g. SHIPPED), or `all`
	#[arg(long, default_value = "all")]
	status: OrderFilter,

	#[command(subcommand)]
	action: Option<OrdersCommands>,
}

#[derive(Subcommand)]
enum OrdersCommands {
	/// Show tracking progress for an order
	Track { order_id: String },
	/// Put the items of a past order back into the cart
	Reorder { order_id: String },
}

#[derive(Args)]
struct CheckoutArgs {
	#[arg(long)]
	first_name: Option<String>,
	#[arg(long)]
	last_name: Option<String>,
	#[arg(long)]
	email: Option<String>,
	#[arg(long)]
	phone: Option<String>,
	#[arg(long)]
	address: Option<String>,
	#[arg(long)]
	city: Option<String>,
	#[arg(long)]
	state: Option<String>,
	#[arg(long)]
	zip: Option<String>,

	/// Name on the card (defaults to the shipping name)
	#[arg(long)]
	card_name: Option<String>,
	#[arg(long)]
	card_number: String,
	/// Expiry as MM/YY
	#[arg(long)]
	expiry: String,
	#[arg(long)]
	cvv: String,

	/// Agree to the Terms & Conditions
	#[arg(long)]
	accept_terms: bool,
}

#[derive(Subcommand)]
enum SessionCommands {
	/// Store an identity token
	Login { token: String },
	/// Clear the session and print the hosted-UI logout link
	Logout {
		/// Origin to return to after logout
		#[arg(long, default_value = "http://localhost:8080")]
		origin: String,
	},
	/// Show whether a token is present
	Status,
}

fn load_config(cli: &Cli) -> Result<StorefrontConfig> {
	let mut config = match &cli.config {
		Some(path) => StorefrontConfig::from_file(path)
			.with_context(|| format!("Failed to load configuration from {}", path))?,
		None => StorefrontConfig::from_env().context("Failed to load configuration")?,
	};

	if cli.mock {
		config.api.use_mock = true;
	} else if cli.real {
		config.api.use_mock = false;
	}

	config.report();
	Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	init_logging(cli.verbose)?;

	let config = load_config(&cli)?;
	let session_store: Arc<dyn SessionStore> = Arc::new(
		FileSessionStore::open(&cli.session_file)
			.with_context(|| format!("Failed to open session file {}", cli.session_file))?,
	);
	let store = Storefront::from_config(config, session_store, Arc::new(LogNotifier))
		.context("Failed to create API gateway")?;

	info!(
		target: "cli",
		"Storefront client started in {} mode",
		store.ctx.gateway().mode()
	);

	match cli.command {
		Commands::Products { ids } => products(&store, &ids).await?,
		Commands::Cart(cmd) => cart(&store, cmd).await?,
		Commands::Orders(args) => orders(&store, args).await?,
		Commands::Checkout(args) => checkout(&store, args).await?,
		Commands::Session(cmd) => session(&store, cmd)?,
		Commands::Links => links(&store)?,
	}

	Ok(())
}

async fn products(store: &Storefront, ids: &[String]) -> Result<()> {
	store.products.refresh().await?;

	let ids: Vec<String> = if ids.is_empty() {
		store.products.catalog().into_keys().collect()
	} else {
		ids.to_vec()
	};

	for id in ids {
		let availability = store.products.availability(&id);
		let marker = match availability {
			Availability::SoldOut => "x",
			Availability::InStock(_) => "+",
			Availability::Unknown => "?",
		};
		println!("{} {:<24} {}", marker, id, availability);
	}
	Ok(())
}

fn print_cart(cart: Option<&Cart>) {
	let Some(cart) = cart.filter(|cart| !cart.is_empty()) else {
		println!("Your cart is empty");
		return;
	};

	for item in &cart.items {
		println!(
			"{:<16} {:<24} {:>6}  ${:>8.2}",
			item.product_id,
			item.product_name,
			format_weight(item.weight_grams),
			item.total_price
		);
	}
	println!("Items: {}  Subtotal: ${:.2}", cart.item_count, cart.subtotal);
}

fn format_weight(grams: u32) -> String {
	if grams >= 1000 {
		format!("{:.1}kg", grams as f64 / 1000.0)
	} else {
		format!("{}g", grams)
	}
}

async fn cart(store: &Storefront, cmd: CartCommands) -> Result<()> {
	match cmd {
		CartCommands::Show => {
			let cart = store.cart.load().await?;
			print_cart(cart.as_ref());
		}
		CartCommands::Add {
			product_id,
			weight_grams,
		} => match store.cart.add_item(&product_id, weight_grams).await? {
			AddOutcome::Added(cart) => print_cart(cart.as_ref()),
			AddOutcome::Dropped => println!("Another add is still in progress"),
		},
		CartCommands::Update {
			product_id,
			weight_grams,
		} => {
			// Load first so an unchanged weight is detected locally
			store.cart.load().await?;
			match store.cart.update_item(&product_id, weight_grams).await? {
				UpdateOutcome::Updated => print_cart(store.cart.cart().as_ref()),
				UpdateOutcome::Unchanged => println!("Weight unchanged"),
			}
		}
		CartCommands::Remove { product_id } => {
			let cart = store.cart.remove_item(&product_id).await?;
			print_cart(cart.as_ref());
		}
		CartCommands::Clear => {
			let cart = store.cart.clear().await?;
			print_cart(cart.as_ref());
		}
	}
	println!("Cart badge: {}", store.cart.badge_count());
	Ok(())
}

async fn orders(store: &Storefront, args: OrdersArgs) -> Result<()> {
	store.orders.load().await?;

	match args.action {
		None => {
			store.orders.set_filter(args.status);
			let visible = store.orders.visible();
			if visible.is_empty() {
				println!("No orders found");
			}
			for order in visible {
				println!(
					"{:<20} {}  {:<10} ${:.2}",
					order.order_id,
					order.created_at.format("%Y-%m-%d %H:%M"),
					order.status.label(),
					order.total_amount
				);
			}
		}
		Some(OrdersCommands::Track { order_id }) => {
			let Some(order) = store.orders.find(&order_id) else {
				bail!("Order {} not found", order_id);
			};
			let progress = tracking(&order.status);
			println!("Order {} ({})", order.order_id, order.status.label());
			println!("  Placed:     {}", order.created_at.format("%b %d %H:%M"));
			println!("  Processing: {:?}", progress.processing);
			println!("  Shipped:    {:?}", progress.shipped);
			println!("  Delivered:  {:?}", progress.delivered);
			if let Some(number) = &order.tracking_number {
				println!("  Tracking:   {}", number);
			}
		}
		Some(OrdersCommands::Reorder { order_id }) => {
			let outcome = store.orders.reorder(&order_id).await?;
			println!("Added {} of {} items", outcome.added, outcome.attempted);
			if let Some(badge) = outcome.badge {
				println!("Cart badge: {}", badge);
			}
		}
	}
	Ok(())
}

async fn checkout(store: &Storefront, args: CheckoutArgs) -> Result<()> {
	if store.checkout.init().await? == CheckoutReadiness::EmptyCart {
		bail!("Your cart is empty");
	}

	let prefill = store.checkout.shipping();
	let shipping = ShippingDetails {
		first_name: args.first_name.unwrap_or(prefill.first_name),
		last_name: args.last_name.unwrap_or(prefill.last_name),
		email: args.email.unwrap_or(prefill.email),
		phone: args.phone.unwrap_or(prefill.phone),
		address: args.address.unwrap_or(prefill.address),
		city: args.city.unwrap_or(prefill.city),
		state: args.state.unwrap_or(prefill.state),
		zip: args.zip.unwrap_or(prefill.zip),
	};
	store.checkout.submit_shipping(shipping)?;

	let payment = PaymentForm {
		card_name: args
			.card_name
			.unwrap_or_else(|| store.checkout.suggested_card_name()),
		card_number: format_card_number(&args.card_number),
		card_expiry: args.expiry,
		card_cvv: args.cvv,
	};
	store
		.checkout
		.submit_payment(payment, Utc::now().date_naive())?;

	if let (Some(pricing), Some(payment)) = (store.checkout.pricing(), store.checkout.payment()) {
		println!("Subtotal: ${:.2}", pricing.subtotal);
		println!("Shipping: ${:.2}", pricing.shipping);
		println!("Tax:      ${:.2}", pricing.tax);
		println!("Total:    ${:.2}", pricing.total);
		println!(
			"Card ending in {} (expires {})",
			payment.card_last4, payment.card_expiry
		);
	}

	let response = store.checkout.place_order(args.accept_terms).await?;
	println!("Order placed: {}", response.order_id);
	Ok(())
}

fn session(store: &Storefront, cmd: SessionCommands) -> Result<()> {
	let session = store.ctx.session();
	match cmd {
		SessionCommands::Login { token } => {
			session.set(ID_TOKEN_KEY, token)?;
			println!("Session token stored");
		}
		SessionCommands::Logout { origin } => {
			let url = store.ctx.hosted_ui().sign_out(session, &origin)?;
			println!("Session cleared");
			println!("Logout: {}", url);
		}
		SessionCommands::Status => {
			if store.ctx.hint().is_signed_in() {
				println!("Signed in (token present, not verified)");
			} else {
				println!("Signed out");
			}
		}
	}
	Ok(())
}

fn links(store: &Storefront) -> Result<()> {
	let ui = store.ctx.hosted_ui();
	println!("Sign in: {}", ui.sign_in_url()?);
	println!("Sign up: {}", ui.sign_up_url()?);
	Ok(())
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;
	use storefront::RecordingNotifier;
	use storefront_gateway::{ApiConfig, IdentityConfig, MemorySessionStore};

	use super::*;

	fn mock_store() -> Storefront {
		let config = StorefrontConfig {
			api: ApiConfig {
				use_mock: true,
				mock_base: concat!(env!("CARGO_MANIFEST_DIR"), "/../../mock").to_string(),
				mock_latency_ms: 0,
				..ApiConfig::default()
			},
			identity: IdentityConfig {
				domain: "https://auth.shop.example".to_string(),
				client_id: "client-1".to_string(),
				redirect_uri: "https://shop.example/auth/callback.html".to_string(),
			},
		};
		Storefront::from_config(
			config,
			Arc::new(MemorySessionStore::new()),
			Arc::new(RecordingNotifier::new()),
		)
		.unwrap()
	}

	#[test]
	fn test_cli_definition() {
		Cli::command().debug_assert();
	}

	#[test]
	fn test_mock_and_real_conflict() {
		assert!(Cli::try_parse_from(["storefront", "--mock", "--real", "links"]).is_err());

		let cli = Cli::try_parse_from(["storefront", "links", "--real"]).unwrap();
		assert!(cli.real && !cli.mock);
		assert!(matches!(cli.command, Commands::Links));
	}

	#[test]
	fn test_orders_arguments() {
		let cli =
			Cli::try_parse_from(["storefront", "orders", "--status", "SHIPPED", "reorder", "ORD-1"])
				.unwrap();
		let Commands::Orders(args) = cli.command else {
			panic!("expected the orders command");
		};
		assert_eq!(args.status.to_string(), "SHIPPED");
		assert!(matches!(
			args.action,
			Some(OrdersCommands::Reorder { ref order_id }) if order_id == "ORD-1"
		));

		let cli = Cli::try_parse_from(["storefront", "orders"]).unwrap();
		let Commands::Orders(args) = cli.command else {
			panic!("expected the orders command");
		};
		assert_eq!(args.status, OrderFilter::All);
		assert!(args.action.is_none());
	}

	#[test]
	fn test_session_login_and_logout() {
		let store = mock_store();

		session(
			&store,
			SessionCommands::Login {
				token: "abc".to_string(),
			},
		)
		.unwrap();
		assert!(store.ctx.hint().is_signed_in());

		session(
			&store,
			SessionCommands::Logout {
				origin: "https://shop.example".to_string(),
			},
		)
		.unwrap();
		assert!(!store.ctx.hint().is_signed_in());
	}

	#[tokio::test]
	async fn test_cart_and_products_commands_in_mock_mode() {
		let store = mock_store();

		products(&store, &[]).await.unwrap();
		cart(&store, CartCommands::Show).await.unwrap();
		cart(
			&store,
			CartCommands::Add {
				product_id: "kenya-nyeri".to_string(),
				weight_grams: 500,
			},
		)
		.await
		.unwrap();
		assert_eq!(store.cart.badge_count(), 3);

		links(&store).unwrap();
	}

	#[test]
	fn test_format_weight() {
		assert_eq!(format_weight(250), "250g");
		assert_eq!(format_weight(1500), "1.5kg");
	}
}
