use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Technology keywords grouped by category. Matching is case-insensitive and
/// word-boundary-anchored so short tokens ("Go", "AI", "R") don't fire inside
/// longer words.
pub const TECH_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "frontend",
        &[
            "React", "React.js", "Angular", "Vue", "Vue.js", "Svelte", "Ember.js",
            "Next.js", "Nuxt.js", "Gatsby", "Remix",
            "JavaScript", "TypeScript", "HTML5", "CSS3", "SASS", "SCSS", "LESS",
            "Tailwind", "TailwindCSS", "Bootstrap", "Material-UI", "Ant Design",
            "Chakra UI", "Shadcn", "Redux", "MobX", "Zustand", "Webpack", "Vite", "Babel",
        ],
    ),
    (
        "backend",
        &[
            "Node.js", "Express", "Express.js", "Nest.js", "Fastify", "Koa",
            "Python", "Django", "Flask", "FastAPI", "Pyramid", "Tornado",
            "Java", "Spring", "Spring Boot", "Spring Cloud", "Hibernate", "Quarkus",
            "Ruby", "Rails", "Ruby on Rails", "Sinatra",
            "Go", "Golang", "Gin", "Echo",
            "PHP", "Laravel", "Symfony", "CodeIgniter", "Yii",
            ".NET", "ASP.NET", "C#", ".NET Core",
            "Rust", "Elixir", "Phoenix", "Scala", "Play Framework",
        ],
    ),
    (
        "mobile",
        &[
            "React Native", "Flutter", "Ionic", "Cordova", "Xamarin", "Capacitor",
            "iOS", "Swift", "SwiftUI", "Objective-C", "Xcode",
            "Android", "Kotlin", "Java Android", "Jetpack Compose", "Android Studio",
        ],
    ),
    (
        "database",
        &[
            "PostgreSQL", "MySQL", "MariaDB", "SQL Server", "Oracle", "SQLite",
            "MongoDB", "Cassandra", "CouchDB", "Neo4j", "ArangoDB",
            "Redis", "Memcached", "Hazelcast",
            "Elasticsearch", "Solr", "Algolia",
            "DynamoDB", "Firebase", "Firestore", "Supabase", "PlanetScale",
            "SQL", "NoSQL",
        ],
    ),
    (
        "cloud",
        &[
            "AWS", "Amazon Web Services", "Azure", "Microsoft Azure",
            "Google Cloud", "GCP", "Google Cloud Platform",
            "AWS Lambda", "AWS EC2", "AWS S3", "AWS RDS",
            "Azure Functions", "Azure DevOps",
            "Google Cloud Functions", "Google App Engine",
            "Heroku", "DigitalOcean", "Vercel", "Netlify", "Render",
            "Railway", "Fly.io", "CloudFlare", "Cloudflare Workers",
        ],
    ),
    (
        "devops",
        &[
            "Docker", "Podman", "containerd",
            "Kubernetes", "K8s", "Docker Swarm", "Nomad", "OpenShift",
            "Jenkins", "GitLab CI", "GitLab CI/CD", "GitHub Actions",
            "CircleCI", "Travis CI", "Azure Pipelines", "Bamboo",
            "TeamCity", "ArgoCD", "Flux",
            "Terraform", "Ansible", "Puppet", "Chef", "CloudFormation",
            "Pulumi", "Vagrant",
            "Prometheus", "Grafana", "ELK Stack", "Datadog", "New Relic",
            "Splunk", "Sentry",
        ],
    ),
    (
        "cicd",
        &[
            "CI/CD", "Continuous Integration", "Continuous Deployment",
            "Continuous Delivery", "Jenkins", "GitHub Actions", "GitLab CI",
            "CircleCI", "Travis CI", "Bamboo", "TeamCity", "Azure DevOps",
            "Bitbucket Pipelines", "Drone", "Spinnaker",
        ],
    ),
    (
        "ai_ml",
        &[
            "Machine Learning", "ML", "AI", "Artificial Intelligence",
            "Deep Learning", "Neural Network", "Neural Networks",
            "TensorFlow", "PyTorch", "Keras", "Scikit-learn", "XGBoost",
            "LightGBM", "Caffe", "MXNet", "ONNX",
            "NLP", "Natural Language Processing", "BERT", "GPT", "Transformer",
            "spaCy", "NLTK", "Hugging Face",
            "Computer Vision", "OpenCV", "YOLO", "CNN",
            "Jupyter", "Pandas", "NumPy", "SciPy",
        ],
    ),
    (
        "architecture",
        &[
            "REST", "REST API", "RESTful", "GraphQL", "gRPC", "SOAP",
            "Microservices", "Monolith", "Serverless", "Event-Driven",
            "Service-Oriented Architecture", "SOA",
            "WebSocket", "Server-Sent Events", "SSE", "Message Queue",
            "Apache Kafka", "RabbitMQ", "ActiveMQ", "MQTT", "ZeroMQ",
            "Event Sourcing", "CQRS", "Saga Pattern", "API Gateway",
        ],
    ),
    (
        "testing",
        &[
            "Jest", "Mocha", "Chai", "Jasmine", "Pytest", "JUnit", "TestNG",
            "RSpec", "Cucumber", "Selenium", "Cypress", "Playwright",
            "Puppeteer", "Testing Library", "Vitest",
        ],
    ),
    (
        "other",
        &[
            "Git", "GitHub", "GitLab", "Bitbucket", "SVN",
            "Blockchain", "Ethereum", "Solidity", "Web3",
            "WordPress", "Drupal", "Contentful", "Strapi", "Sanity",
            "Socket.io", "WebRTC",
            "Postman", "Swagger", "OpenAPI",
        ],
    ),
];

/// Industry labels with their trigger phrases. One hit flags the industry;
/// matching is plain substring containment on lowercased text.
pub const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "E-commerce",
        &[
            "ecommerce", "e-commerce", "online store", "online shop", "retail", "shopping",
            "cart", "checkout", "marketplace", "b2c", "online retail", "webshop",
            "product catalog", "storefront", "shopify", "woocommerce", "magento",
        ],
    ),
    (
        "FinTech",
        &[
            "fintech", "finance", "financial", "banking", "payment", "payments",
            "financial services", "cryptocurrency", "crypto", "blockchain finance",
            "wealth management", "trading", "stock", "investment", "lending",
            "digital wallet", "mobile banking", "neobank", "payment gateway",
            "remittance", "forex", "peer-to-peer lending", "robo-advisor",
        ],
    ),
    (
        "Healthcare",
        &[
            "healthcare", "health", "medical", "hospital", "patient", "clinic",
            "telemedicine", "healthtech", "pharmaceutical", "clinical", "doctor",
            "nurse", "diagnosis", "treatment", "therapy", "medicine", "pharmacy",
            "electronic health record", "ehr", "emr", "telehealth", "wellness",
            "mental health", "healthcare provider", "medical device",
        ],
    ),
    (
        "SaaS",
        &[
            "saas", "software as a service", "cloud software", "subscription",
            "b2b software", "enterprise software", "cloud-based", "subscription model",
            "software platform", "api service", "hosted solution", "paas",
            "platform as a service", "multi-tenant",
        ],
    ),
    (
        "AgriTech",
        &[
            "agritech", "agriculture", "farming", "agri", "crop", "crops",
            "agricultural", "farm", "precision agriculture", "agtech",
            "livestock", "harvest", "irrigation", "soil", "farmer",
            "agricultural technology", "farm management", "vertical farming",
        ],
    ),
    (
        "Logistics",
        &[
            "logistics", "supply chain", "shipping", "delivery", "warehouse",
            "transportation", "freight", "fleet", "distribution", "courier",
            "last mile", "fulfillment", "logistics management", "cargo",
            "dispatch", "route optimization", "inventory management",
            "supply chain management", "third-party logistics", "3pl",
        ],
    ),
    (
        "Real Estate",
        &[
            "real estate", "property", "housing", "proptech", "realty",
            "real estate tech", "rental", "lease", "landlord", "tenant",
            "commercial property", "residential property", "real estate management",
            "property management", "real estate platform", "home buying", "home selling",
        ],
    ),
    (
        "Media & Entertainment",
        &[
            "media", "streaming", "content", "video", "entertainment",
            "music", "gaming", "games", "movie", "film", "television", "tv",
            "broadcast", "publishing", "digital media", "content creation",
            "video streaming", "music streaming", "ott", "over-the-top",
            "social media", "influencer", "creator economy",
        ],
    ),
    (
        "Insurance",
        &[
            "insurance", "insurtech", "claims", "policy", "policies",
            "underwriting", "insurer", "insurance company", "life insurance",
            "health insurance", "auto insurance", "property insurance",
            "insurance platform", "insurance technology", "reinsurance",
            "actuarial", "risk assessment",
        ],
    ),
    (
        "Retail",
        &[
            "retail", "store", "stores", "merchandise", "pos", "point of sale",
            "brick and mortar", "retail chain", "department store", "boutique",
            "retail technology", "retail management", "retail analytics",
            "omnichannel", "in-store", "retail operations",
        ],
    ),
    (
        "Education",
        &[
            "education", "edtech", "learning", "school", "university", "college",
            "e-learning", "lms", "learning management system", "training",
            "online learning", "online education", "student", "teacher",
            "educational technology", "course", "classroom", "curriculum",
            "tutoring", "mooc", "educational platform",
        ],
    ),
    (
        "Travel & Hospitality",
        &[
            "travel", "hospitality", "hotel", "tourism", "booking", "reservation",
            "restaurant", "accommodation", "vacation", "trip", "flight",
            "airline", "travel booking", "travel agency", "hotel booking",
            "food service", "hospitality industry", "guest", "lodging",
        ],
    ),
    (
        "Manufacturing",
        &[
            "manufacturing", "industry 4.0", "production", "factory", "factories",
            "supply chain", "assembly", "industrial", "plant", "manufacturing process",
            "quality control", "automation", "production line", "manufacturer",
            "industrial automation", "smart manufacturing",
        ],
    ),
    (
        "Energy",
        &[
            "energy", "renewable", "renewable energy", "solar", "wind", "utilities",
            "power", "electricity", "oil", "gas", "petroleum", "energy sector",
            "clean energy", "green energy", "energy management", "power generation",
            "energy efficiency", "grid", "utility company",
        ],
    ),
    (
        "Automotive",
        &[
            "automotive", "automobile", "car", "vehicle", "auto", "mobility",
            "electric vehicle", "ev", "autonomous vehicle", "self-driving",
            "automotive industry", "car manufacturer", "ride-sharing",
            "car rental", "automotive technology",
        ],
    ),
    (
        "Telecommunications",
        &[
            "telecommunications", "telecom", "telco", "5g", "4g", "network",
            "mobile network", "internet service provider", "isp", "connectivity",
            "broadband", "fiber optic", "wireless", "cellular",
        ],
    ),
    (
        "Food & Beverage",
        &[
            "food", "beverage", "restaurant", "food delivery", "food service",
            "catering", "dining", "food tech", "foodtech", "meal",
            "food industry", "culinary", "recipe", "cooking", "food ordering",
        ],
    ),
    (
        "Gaming",
        &[
            "gaming", "game", "games", "video game", "esports", "e-sports",
            "game development", "game studio", "mobile gaming", "pc gaming",
            "console gaming", "game publisher", "indie game", "multiplayer",
        ],
    ),
    (
        "Fashion & Apparel",
        &[
            "fashion", "apparel", "clothing", "garment", "textile", "fashion tech",
            "fashion industry", "fashion retail", "fashion ecommerce", "style",
            "wardrobe", "fashion platform", "online fashion",
        ],
    ),
    (
        "Construction",
        &[
            "construction", "building", "infrastructure", "contractor", "architecture",
            "construction industry", "construction management", "construction technology",
            "construction project", "civil engineering", "building materials",
        ],
    ),
    (
        "Legal Tech",
        &[
            "legal tech", "legaltech", "legal", "law", "lawyer", "attorney",
            "legal services", "legal technology", "legal platform", "litigation",
            "compliance", "contract management", "legal software",
        ],
    ),
    (
        "HR Tech",
        &[
            "hr tech", "hrtech", "human resources", "hr", "recruitment", "hiring",
            "talent", "talent management", "employee", "workforce", "payroll",
            "hr management", "hr platform", "applicant tracking", "onboarding",
        ],
    ),
    (
        "Cybersecurity",
        &[
            "cybersecurity", "cyber security", "security", "infosec", "information security",
            "data security", "network security", "threat detection", "firewall",
            "encryption", "security platform", "vulnerability", "penetration testing",
        ],
    ),
    (
        "Government",
        &[
            "government", "public sector", "civic tech", "govtech", "municipal",
            "federal", "state government", "public administration", "civic",
            "government services", "e-government",
        ],
    ),
    (
        "Non-profit",
        &[
            "non-profit", "nonprofit", "ngo", "charity", "charitable", "foundation",
            "social impact", "social good", "philanthropic", "humanitarian",
            "non-governmental organization",
        ],
    ),
];

static TECH_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TECH_KEYWORDS
        .iter()
        .flat_map(|(_, terms)| terms.iter())
        .map(|term| {
            let pattern = format!(r"\b{}\b", regex::escape(&term.to_lowercase()));
            (*term, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Detect taxonomy technologies mentioned in free text.
/// Returns the matched terms with taxonomy casing, sorted, deduplicated.
pub fn detect_technologies(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let detected: BTreeSet<&str> = TECH_MATCHERS
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(term, _)| *term)
        .collect();
    detected.into_iter().map(String::from).collect()
}

/// Detect industries mentioned in free text. The first matching keyword
/// flags an industry and moves on to the next; multi-label output is
/// expected and exposed as-is, sorted.
pub fn detect_industries(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let detected: BTreeSet<&str> = INDUSTRY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(industry, _)| *industry)
        .collect();
    detected.into_iter().map(String::from).collect()
}
