use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Index into `weights`, chosen proportionally.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut pick = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            pick -= w;
            if pick <= 0.0 {
                return i;
            }
        }
        weights.len() - 1
    }
}

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // (category, typical order value in INR, spread of ln(price))
    let categories: [(&str, f64, f64); 6] = [
        ("Electronics", 14000.0, 0.9),
        ("Clothing", 1200.0, 0.7),
        ("Home & Kitchen", 2500.0, 0.8),
        ("Beauty", 700.0, 0.6),
        ("Toys", 900.0, 0.7),
        ("Books", 450.0, 0.5),
    ];
    let states = [
        "Maharashtra",
        "Delhi",
        "Karnataka",
        "Tamil Nadu",
        "West Bengal",
        "Uttar Pradesh",
        "Gujarat",
        "Kerala",
    ];
    let payment_methods = ["UPI", "Card", "Net Banking", "COD", "Wallet"];
    let payment_weights = [0.38, 0.24, 0.10, 0.20, 0.08];
    let statuses = ["Delivered", "In Transit", "Returned", "Cancelled"];
    let status_weights = [0.85, 0.07, 0.05, 0.03];
    // Sales skew heavily toward the festive season (Oct/Nov).
    let month_weights = [
        0.5, 0.5, 0.6, 0.6, 0.7, 0.7, 0.8, 0.9, 1.1, 2.6, 2.0, 1.0,
    ];

    let output_path = "sample_sales.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record([
        "Date",
        "Product_Category",
        "State",
        "Payment_Method",
        "Total_Sales_INR",
        "Review_Rating",
        "Delivery_Status",
    ])?;

    let n_rows = 2500;
    for _ in 0..n_rows {
        let month = rng.weighted(&month_weights);
        let day = 1 + (rng.next_u64() % u64::from(DAYS_IN_MONTH[month])) as u32;
        let date = format!("2025-{:02}-{day:02}", month + 1);

        let (category, typical, spread) = categories[rng.weighted(&[1.0; 6])];
        let sales = (typical.ln() + rng.gauss(0.0, spread)).exp().round();

        let state = states[rng.weighted(&[1.0; 8])];
        let payment = payment_methods[rng.weighted(&payment_weights)];
        let status = statuses[rng.weighted(&status_weights)];

        // Ratings cluster near the top like real marketplace reviews; late
        // or returned orders rate worse.
        let base = if status == "Delivered" { 4.2 } else { 2.9 };
        let rating = rng.gauss(base, 0.8).round().clamp(1.0, 5.0);

        let sales = sales.to_string();
        let rating = rating.to_string();
        writer.write_record([
            date.as_str(),
            category,
            state,
            payment,
            sales.as_str(),
            rating.as_str(),
            status,
        ])?;
    }
    writer.flush()?;

    println!("Wrote {n_rows} sales rows to {output_path}");
    Ok(())
}
