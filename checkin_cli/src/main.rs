use checkin_core::checkin::RECIPES_FILE;
use checkin_core::*;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "checkin")]
#[command(about = "Weekly nutrition check-in and TDEE recalibration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/checkin/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User whose logs and profile are used
    #[arg(long, global = true, default_value = "default")]
    user: String,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a scale weight
    LogWeight {
        #[arg(long)]
        kg: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Log a day's macros, overriding any eaten meals for that date
    LogMacros {
        #[arg(long)]
        calories: f64,

        #[arg(long)]
        protein: f64,

        #[arg(long)]
        carbs: f64,

        #[arg(long)]
        fat: f64,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Plan a meal from the recipe catalog
    PlanMeal {
        #[arg(long)]
        recipe: String,

        #[arg(long)]
        servings: f64,

        #[arg(long)]
        date: Option<NaiveDate>,

        /// Record the meal as already eaten
        #[arg(long)]
        eaten: bool,
    },

    /// Mark a planned meal as eaten
    Eat {
        meal_id: Uuid,
    },

    /// Import weights from a CSV file with `date,weight_kg` columns
    ImportWeights {
        csv: PathBuf,
    },

    /// Show consumed and planned macros for a date
    Consumed {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Set goal and macro targets
    Goal {
        #[arg(long, value_enum)]
        goal: GoalArg,

        /// Target weekly weight change in kg (negative to lose)
        #[arg(long, allow_negative_numbers = true)]
        rate: f64,

        /// Protein target in grams
        #[arg(long)]
        protein: f64,

        /// Fat target in grams
        #[arg(long)]
        fat: f64,
    },

    /// Run the weekly check-in
    Run {
        /// Check-in date recorded in the profile, defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GoalArg {
    FatLoss,
    MuscleGain,
    Maintenance,
    NotSpecified,
}

impl From<GoalArg> for PrimaryGoal {
    fn from(goal: GoalArg) -> Self {
        match goal {
            GoalArg::FatLoss => PrimaryGoal::FatLoss,
            GoalArg::MuscleGain => PrimaryGoal::MuscleGain,
            GoalArg::Maintenance => PrimaryGoal::Maintenance,
            GoalArg::NotSpecified => PrimaryGoal::NotSpecified,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    checkin_core::logging::init(cli.verbose);

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    let user = cli.user.as_str();
    tracing::debug!("Data directory {:?}, user {}", config.data.data_dir, user);
    let today = Local::now().date_naive();

    match cli.command {
        Commands::LogWeight { kg, date } => cmd_log_weight(&config, user, kg, date.unwrap_or(today)),
        Commands::LogMacros {
            calories,
            protein,
            carbs,
            fat,
            date,
        } => cmd_log_macros(
            &config,
            user,
            Macros::new(calories, protein, carbs, fat),
            date.unwrap_or(today),
        ),
        Commands::PlanMeal {
            recipe,
            servings,
            date,
            eaten,
        } => cmd_plan_meal(&config, user, &recipe, servings, date.unwrap_or(today), eaten),
        Commands::Eat { meal_id } => cmd_eat(&config, user, meal_id),
        Commands::ImportWeights { csv } => cmd_import_weights(&config, user, csv),
        Commands::Consumed { date } => cmd_consumed(&config, user, date.unwrap_or(today)),
        Commands::Goal {
            goal,
            rate,
            protein,
            fat,
        } => cmd_goal(&config, user, goal.into(), rate, protein, fat),
        Commands::Run { today: date } => cmd_run(&config, user, date.unwrap_or(today)),
    }
}

fn cmd_log_weight(config: &Config, user: &str, kg: f64, date: NaiveDate) -> Result<()> {
    let store = JsonlLogStore::new(&config.data.data_dir);
    store.append_weight(user, &WeightLogEntry::new(date, kg))?;

    println!("✓ Logged {:.1} kg for {}", kg, date);
    Ok(())
}

fn cmd_log_macros(config: &Config, user: &str, macros: Macros, date: NaiveDate) -> Result<()> {
    let store = JsonlLogStore::new(&config.data.data_dir);
    store.append_manual_macros(user, &ManualMacrosLogEntry { date, macros })?;

    println!("✓ Logged macros for {}", date);
    print_macros(&macros);
    Ok(())
}

fn cmd_plan_meal(
    config: &Config,
    user: &str,
    recipe_id: &str,
    servings: f64,
    date: NaiveDate,
    eaten: bool,
) -> Result<()> {
    let recipes = RecipeBook::load(&config.data.data_dir.join(RECIPES_FILE))?;
    let recipe = recipes
        .get(recipe_id)
        .ok_or_else(|| Error::RecipeCatalog(format!("unknown recipe '{}'", recipe_id)))?;

    let mut meal = PlannedMealEntry::new(date, recipe_id, servings);
    if eaten {
        meal = meal.eaten();
    }

    let store = JsonlLogStore::new(&config.data.data_dir);
    store.append_meal(user, &meal)?;

    println!(
        "✓ {} meal: {} x{} on {}",
        if eaten { "Eaten" } else { "Planned" },
        recipe.name,
        servings,
        date
    );
    println!("{}", meal.id);
    Ok(())
}

fn cmd_eat(config: &Config, user: &str, meal_id: Uuid) -> Result<()> {
    let store = JsonlLogStore::new(&config.data.data_dir);
    let meal = store
        .meal(user, meal_id)?
        .ok_or_else(|| Error::LogStore(format!("no planned meal with id {}", meal_id)))?;

    if meal.status == MealStatus::Eaten {
        println!("Meal {} is already marked eaten.", meal_id);
        return Ok(());
    }

    let date = meal.date;
    store.append_meal(user, &meal.eaten())?;

    println!("✓ Marked meal {} eaten ({})", meal_id, date);
    Ok(())
}

fn cmd_import_weights(config: &Config, user: &str, csv: PathBuf) -> Result<()> {
    let store = JsonlLogStore::new(&config.data.data_dir);
    let imported = import_weights(&store, user, &csv)?;

    println!("✓ Imported {} weights from {}", imported, csv.display());
    Ok(())
}

fn cmd_consumed(config: &Config, user: &str, date: NaiveDate) -> Result<()> {
    let store = JsonlLogStore::new(&config.data.data_dir);
    let recipes = RecipeBook::load(&config.data.data_dir.join(RECIPES_FILE))?;
    let aggregator = ConsumptionAggregator::new(&store, &recipes);

    let consumed = aggregator.consumed_macros(user, date)?;
    let planned = aggregator.planned_macros(user, date)?;

    println!("{}", date);
    println!("  Consumed:");
    print_macros(&consumed);
    println!("  Planned:");
    print_macros(&planned);
    Ok(())
}

fn cmd_goal(
    config: &Config,
    user: &str,
    goal: PrimaryGoal,
    rate: f64,
    protein: f64,
    fat: f64,
) -> Result<()> {
    // Reject invalid targets now rather than at the next check-in
    GoalProfile::try_from(GoalProfileInput {
        primary_goal: Some(goal),
        target_weight_change_rate_kg: Some(rate),
        current_protein_target: Some(protein),
        current_fat_target: Some(fat),
        current_tdee: None,
    })?;

    let profiles = ProfileFileStore::new(&config.data.data_dir);
    profiles.set_goals(user, goal, rate, protein, fat)?;

    println!("✓ Goal set: {:?}, {:+.2} kg/week", goal, rate);
    println!("  Protein: {} g  Fat: {} g", protein, fat);
    Ok(())
}

fn cmd_run(config: &Config, user: &str, today: NaiveDate) -> Result<()> {
    let engine = CheckInEngine::from_config(config)?;
    let result = engine.run_weekly_check_in_on(user, today);

    if !result.success {
        eprintln!("✗ {}", result.message);
        if result.error_kind == Some(ErrorKind::DataInsufficiency) {
            eprintln!("  Keep logging weight and food, then try again.");
        }
        std::process::exit(1);
    }

    println!("✓ {}", result.message);

    if let Some(report) = result.report {
        println!();
        println!(
            "  Window: {} to {} ({} weigh-ins)",
            report.window_start, report.window_end, report.window_days
        );
        println!(
            "  Average intake: {:.0} kcal over {} days",
            report.average_daily_calories, report.days_with_calorie_data
        );
        println!(
            "  Trend change: {:+.2} kg ({:+.2} kg/week)",
            report.weight_change_kg, report.actual_weekly_weight_change_kg
        );
    }

    if let Some(recommendation) = result.recommendation {
        println!();
        println!("  New targets:");
        print_macros(&recommendation.new_macro_targets);
        println!();
        println!("  {}", recommendation.coaching_summary);
    }

    Ok(())
}

fn print_macros(macros: &Macros) {
    println!(
        "    {:.0} kcal  P {:.0} g  C {:.0} g  F {:.0} g",
        macros.calories, macros.protein, macros.carbs, macros.fat
    );
}
