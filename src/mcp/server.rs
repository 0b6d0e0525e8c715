//! Pantry MCP Server Implementation
//!
//! Implements the MCP server with all pantry tools.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::ledger::StockLedger;
use crate::store::SqliteStore;
use crate::tools::status::StatusTracker;
use crate::tools::{grocery, stock, units};

/// Pantry MCP Service
#[derive(Clone)]
pub struct PantryService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    ledger: Arc<StockLedger<SqliteStore>>,
    tool_router: ToolRouter<PantryService>,
}

impl PantryService {
    pub fn new(database_path: PathBuf, ledger: StockLedger<SqliteStore>) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            ledger: Arc::new(ledger),
            tool_router: Self::tool_router(),
        }
    }

    fn ledger(&self) -> &StockLedger<SqliteStore> {
        &self.ledger
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Stock Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InsertStockParams {
    /// Item name (exact, case-sensitive)
    pub name: String,
    /// Quantity as a decimal string, e.g. "1.5"
    pub quantity: String,
    /// Unit, e.g. "kg", "l", "lata" (plurals accepted)
    pub unit: String,
    /// Expiration date (YYYY-MM-DD)
    pub expiration_date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveStockParams {
    /// Item name (exact, case-sensitive)
    pub name: String,
    /// Quantity as a decimal string, e.g. "0.33"
    pub quantity: String,
    /// Unit of the quantity; converted to each batch's unit as needed
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ItemNameParams {
    /// Item name (exact, case-sensitive)
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExpiringStockParams {
    /// Days from today to look ahead (default 7)
    pub within_days: Option<i64>,
    /// Explicit cutoff date (YYYY-MM-DD); overrides within_days
    pub before: Option<String>,
}

// ============================================================================
// Unit Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertUnitsParams {
    /// Quantity as a decimal string
    pub quantity: String,
    pub from_unit: String,
    pub to_unit: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl PantryService {
    // --- Status ---

    #[tool(description = "Get the current status of the pantry service including build info, database status, and process information")]
    async fn pantry_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(self.ledger.store().database());
        to_json(&status)
    }

    #[tool(description = "Get instructions for using the pantry tools. Call this when starting a pantry session or when unsure how stock removal and units work.")]
    fn pantry_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::PANTRY_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(PANTRY_INSTRUCTIONS)]))
    }

    // --- Stock ---

    #[tool(description = "Add a batch of an item with its own quantity, unit and expiration date. Creates the item on first use.")]
    fn insert_stock(&self, Parameters(p): Parameters<InsertStockParams>) -> Result<CallToolResult, McpError> {
        let result = stock::insert_stock(self.ledger(), &p.name, &p.quantity, &p.unit, &p.expiration_date)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove a quantity of an item, consuming the earliest-expiring batches first and converting units as needed. Consumed batches are not restored if stock runs out.")]
    fn remove_stock(&self, Parameters(p): Parameters<RemoveStockParams>) -> Result<CallToolResult, McpError> {
        let result = stock::remove_stock(self.ledger(), &p.name, &p.quantity, &p.unit)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get the total stock of an item, expressed in the unit of its first batch")]
    fn query_stock(&self, Parameters(p): Parameters<ItemNameParams>) -> Result<CallToolResult, McpError> {
        let result = stock::query_stock(self.ledger(), &p.name).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove every batch of an item. The item itself is kept.")]
    fn remove_all_stock(&self, Parameters(p): Parameters<ItemNameParams>) -> Result<CallToolResult, McpError> {
        let result = stock::remove_all_stock(self.ledger(), &p.name).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove every batch of every item in the pantry")]
    fn clear_stock(&self) -> Result<CallToolResult, McpError> {
        let result = stock::clear_stock(self.ledger()).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List every batch in the pantry, ordered by item name then expiration date")]
    fn list_stock(&self) -> Result<CallToolResult, McpError> {
        let result = stock::list_stock(self.ledger()).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List batches expiring within a number of days (default 7) or on or before a given date, earliest first")]
    fn expiring_stock(&self, Parameters(p): Parameters<ExpiringStockParams>) -> Result<CallToolResult, McpError> {
        let today = Local::now().date_naive();
        let result = stock::expiring_stock(self.ledger(), p.within_days, p.before.as_deref(), today)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Grocery List ---

    #[tool(description = "Add an item to the grocery list. Also registers it as a pantry item. Duplicates are reported.")]
    fn add_grocery(&self, Parameters(p): Parameters<ItemNameParams>) -> Result<CallToolResult, McpError> {
        let result = grocery::add_grocery(self.ledger(), &p.name).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove an item from the grocery list")]
    fn remove_grocery(&self, Parameters(p): Parameters<ItemNameParams>) -> Result<CallToolResult, McpError> {
        let result = grocery::remove_grocery(self.ledger(), &p.name).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List the grocery list in the order items were added")]
    fn list_grocery(&self) -> Result<CallToolResult, McpError> {
        let result = grocery::list_grocery(self.ledger()).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Empty the grocery list")]
    fn clear_grocery(&self) -> Result<CallToolResult, McpError> {
        let result = grocery::clear_grocery(self.ledger()).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Units ---

    #[tool(description = "Convert a quantity between two units using the pantry's conversion table")]
    fn convert_units(&self, Parameters(p): Parameters<ConvertUnitsParams>) -> Result<CallToolResult, McpError> {
        let result = units::convert_units(self.ledger(), &p.quantity, &p.from_unit, &p.to_unit)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List every known unit and the units it converts to directly")]
    fn list_units(&self) -> Result<CallToolResult, McpError> {
        to_json(&units::list_units(self.ledger()))
    }
}

#[tool_handler]
impl ServerHandler for PantryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pantry".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Pantry Stock Ledger".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Pantry Stock Ledger - Perishable inventory tracked per batch with expiration dates and mixed units. \
                 IMPORTANT: Call pantry_instructions first. \
                 Stock: insert_stock, remove_stock (earliest expiration first), query_stock, list_stock, expiring_stock, \
                 remove_all_stock, clear_stock. \
                 Grocery list: add_grocery, remove_grocery, list_grocery, clear_grocery. \
                 Units: convert_units, list_units. \
                 Quantities are decimal strings; dates are YYYY-MM-DD."
                    .into(),
            ),
        }
    }
}
