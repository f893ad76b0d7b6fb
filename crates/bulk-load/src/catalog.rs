//! TPC-DS table catalog.

use serde::Serialize;

/// One target table and its primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableUnit {
    pub name: String,
    /// Empty if the table has no primary key.
    pub primary_key: Vec<String>,
}

impl TableUnit {
    pub fn new(name: impl Into<String>, primary_key: &[&str]) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Name of the primary-key constraint, `<table>_pkey`.
    pub fn constraint_name(&self) -> Option<String> {
        if self.primary_key.is_empty() {
            None
        } else {
            Some(format!("{}_pkey", self.name))
        }
    }
}

/// The 25 TPC-DS tables in load order.
pub fn tpcds_tables() -> Vec<TableUnit> {
    vec![
        TableUnit::new("call_center", &["cc_call_center_sk"]),
        TableUnit::new("catalog_page", &["cp_catalog_page_sk"]),
        TableUnit::new("catalog_returns", &["cr_item_sk", "cr_order_number"]),
        TableUnit::new("catalog_sales", &["cs_item_sk", "cs_order_number"]),
        TableUnit::new("customer", &["c_customer_sk"]),
        TableUnit::new("customer_address", &["ca_address_sk"]),
        TableUnit::new("customer_demographics", &["cd_demo_sk"]),
        TableUnit::new("date_dim", &["d_date_sk"]),
        TableUnit::new("dbgen_version", &[]),
        TableUnit::new("household_demographics", &["hd_demo_sk"]),
        TableUnit::new("income_band", &["ib_income_band_sk"]),
        TableUnit::new(
            "inventory",
            &["inv_date_sk", "inv_item_sk", "inv_warehouse_sk"],
        ),
        TableUnit::new("item", &["i_item_sk"]),
        TableUnit::new("promotion", &["p_promo_sk"]),
        TableUnit::new("reason", &["r_reason_sk"]),
        TableUnit::new("ship_mode", &["sm_ship_mode_sk"]),
        TableUnit::new("store", &["s_store_sk"]),
        TableUnit::new("store_returns", &["sr_item_sk", "sr_ticket_number"]),
        TableUnit::new("store_sales", &["ss_item_sk", "ss_ticket_number"]),
        TableUnit::new("time_dim", &["t_time_sk"]),
        TableUnit::new("warehouse", &["w_warehouse_sk"]),
        TableUnit::new("web_page", &["wp_web_page_sk"]),
        TableUnit::new("web_returns", &["wr_item_sk", "wr_order_number"]),
        TableUnit::new("web_sales", &["ws_item_sk", "ws_order_number"]),
        TableUnit::new("web_site", &["web_site_sk"]),
    ]
}
