//! Fixture Generator Module
//!
//! Random test data used by the `get_or_create*` cache conveniences.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{AddressData, ProductData, UserData};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Edsger",
    "Radia", "Niklaus", "Hedy", "Donald", "Katherine", "John",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson",
    "Allen", "Dijkstra", "Perlman", "Wirth", "Lamarr", "Knuth", "Johnson", "Backus",
];
const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

const SEARCH_TERMS: &[&str] = &[
    "laptop", "phone", "camera", "book", "shirt", "shoes", "watch", "headphones",
];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "Small", "Ergonomic", "Rustic", "Intelligent", "Gorgeous", "Incredible", "Sleek", "Durable",
];
const PRODUCT_MATERIALS: &[&str] = &[
    "Steel", "Wooden", "Concrete", "Plastic", "Cotton", "Granite", "Rubber", "Leather",
];
const PRODUCT_NOUNS: &[&str] = &[
    "Chair", "Car", "Computer", "Keyboard", "Gloves", "Pants", "Shirt", "Table", "Shoes", "Hat",
];
const DEPARTMENTS: &[&str] = &[
    "Books", "Computers", "Electronics", "Apparel", "Jewelry", "Home", "Sports", "Toys",
];
const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna", "aliqua",
];

const STREET_NAMES: &[&str] = &[
    "Maple", "Oak", "Cedar", "Elm", "Pine", "Lake", "Hill", "Sunset", "Park", "River",
];
const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Road", "Lane", "Drive", "Court"];
const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Fairview", "Franklin", "Greenville", "Madison", "Georgetown",
];
const STATES: &[&str] = &["California", "Texas", "Ohio", "Oregon", "Florida", "Nevada", "Maine"];
const COUNTRIES: &[&str] = &["United States", "Canada", "United Kingdom", "Germany", "France"];

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";
const PASSWORD_LEN: usize = 12;

// == Fixture Source ==
/// Producer of fresh fixtures, consumed by the cache as opaque factories.
pub trait FixtureSource: Send + Sync {
    fn generate_user_data(&self) -> UserData;
    fn generate_product_data(&self) -> ProductData;
    fn generate_search_term(&self) -> String;
    fn generate_address_data(&self) -> AddressData;
}

// == Random Fixtures ==
/// `FixtureSource` backed by a seedable random number generator.
#[derive(Debug)]
pub struct RandomFixtures {
    rng: Mutex<StdRng>,
}

impl RandomFixtures {
    /// Creates a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a generator that yields the same sequence for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generates a 12 character password containing at least one upper case
    /// letter, lower case letter, digit and special character.
    pub fn generate_strong_password(&self) -> String {
        let mut rng = self.rng.lock();
        strong_password(&mut rng)
    }
}

impl Default for RandomFixtures {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureSource for RandomFixtures {
    fn generate_user_data(&self) -> UserData {
        let mut rng = self.rng.lock();
        let first_name = pick(&mut rng, FIRST_NAMES);
        let last_name = pick(&mut rng, LAST_NAMES);
        let email = format!(
            "{}.{}{}@{}",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            rng.random_range(1000..10000u32),
            pick(&mut rng, EMAIL_DOMAINS)
        );
        let password = strong_password(&mut rng);

        let user = UserData {
            first_name,
            last_name,
            email,
            confirm_password: password.clone(),
            password,
            day: rng.random_range(1..=28),
            month: rng.random_range(1..=12),
            year: rng.random_range(1970..2000),
        };
        debug!(email = %user.email, "Generated user data");
        user
    }

    fn generate_product_data(&self) -> ProductData {
        let mut rng = self.rng.lock();
        let name = format!(
            "{} {} {}",
            pick(&mut rng, PRODUCT_ADJECTIVES),
            pick(&mut rng, PRODUCT_MATERIALS),
            pick(&mut rng, PRODUCT_NOUNS)
        );
        let cents: u32 = rng.random_range(100..100_000);

        ProductData {
            name,
            price: format!("{}.{:02}", cents / 100, cents % 100),
            description: sentence(&mut rng),
            category: pick(&mut rng, DEPARTMENTS),
        }
    }

    fn generate_search_term(&self) -> String {
        let mut rng = self.rng.lock();
        pick(&mut rng, SEARCH_TERMS)
    }

    fn generate_address_data(&self) -> AddressData {
        let mut rng = self.rng.lock();
        let street = format!(
            "{} {} {}",
            rng.random_range(1..10000u32),
            pick(&mut rng, STREET_NAMES),
            pick(&mut rng, STREET_SUFFIXES)
        );

        AddressData {
            street,
            city: pick(&mut rng, CITIES),
            state: pick(&mut rng, STATES),
            zip_code: format!("{:05}", rng.random_range(0..100_000u32)),
            country: pick(&mut rng, COUNTRIES),
            phone: format!(
                "({:03}) {:03}-{:04}",
                rng.random_range(200..1000u32),
                rng.random_range(200..1000u32),
                rng.random_range(0..10_000u32)
            ),
        }
    }
}

// == Helpers ==
fn pick(rng: &mut StdRng, words: &[&str]) -> String {
    words.choose(rng).copied().unwrap_or_default().to_string()
}

fn sentence(rng: &mut StdRng) -> String {
    let count = rng.random_range(4..9);
    let words: Vec<&str> = (0..count)
        .filter_map(|_| LOREM.choose(rng).copied())
        .collect();
    let mut text = words.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

fn strong_password(rng: &mut StdRng) -> String {
    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LEN);
    for class in [UPPER, LOWER, DIGITS, SPECIAL] {
        if let Some(&c) = class.choose(rng) {
            chars.push(c);
        }
    }

    let all: Vec<u8> = [UPPER, LOWER, DIGITS, SPECIAL].concat();
    while chars.len() < PASSWORD_LEN {
        if let Some(&c) = all.choose(rng) {
            chars.push(c);
        }
    }

    chars.shuffle(rng);
    chars.into_iter().map(char::from).collect()
}
