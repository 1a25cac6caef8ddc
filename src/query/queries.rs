/// Single listing by id
pub const GET_LISTING: &str = r#"
    SELECT id, owner_id, category, name, quantity, unit, is_organic, created_at
    FROM listings
    WHERE id = ?
"#;

/// All listings, oldest first so the merged view is stable
pub const GET_ALL_LISTINGS: &str = r#"
    SELECT id, owner_id, category, name, quantity, unit, is_organic, created_at
    FROM listings
    ORDER BY created_at ASC, id ASC
"#;

/// Listings owned by one farmer
pub const GET_LISTINGS_BY_OWNER: &str = r#"
    SELECT id, owner_id, category, name, quantity, unit, is_organic, created_at
    FROM listings
    WHERE owner_id = ?
    ORDER BY created_at DESC
"#;

/// Winning bid for a listing: highest amount among non-retracted bids,
/// earliest placement first on ties, insertion order as the final
/// tie-break for identical timestamps
pub const GET_MAX_BID: &str = r#"
    SELECT id, listing_id, bidder_id, amount, placed_at, retracted_at
    FROM bids
    WHERE listing_id = ? AND retracted_at IS NULL
    ORDER BY amount DESC, placed_at ASC, id ASC
    LIMIT 1
"#;

/// Live bids against a listing, newest first
pub const GET_LISTING_BIDS: &str = r#"
    SELECT id, listing_id, bidder_id, amount, placed_at, retracted_at
    FROM bids
    WHERE listing_id = ? AND retracted_at IS NULL
    ORDER BY placed_at DESC, id DESC
"#;

/// One bidder's live bids joined with listing metadata
pub const GET_BIDS_FOR_BIDDER: &str = r#"
    SELECT b.id, b.listing_id, b.bidder_id, b.amount, b.placed_at,
           l.name AS listing_name, l.category AS listing_category, l.unit AS listing_unit
    FROM bids b
    JOIN listings l ON l.id = b.listing_id
    WHERE b.bidder_id = ? AND b.retracted_at IS NULL
    ORDER BY b.placed_at DESC, b.id DESC
"#;

/// All price entries
pub const GET_PRICE_ENTRIES: &str = r#"
    SELECT id, item_name, category, price_per_unit, unit, last_set_at
    FROM price_entries
    ORDER BY category ASC, item_name ASC
"#;

/// The single reset window record
pub const GET_RESET_WINDOW: &str = "SELECT next_reset_at FROM reset_window WHERE id = 1";
