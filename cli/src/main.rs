use clap::{Parser, Subcommand};
use eduportal::model::entity::{
    Module, ModuleCreate, Program, ProgramCreate, Topic, TopicCreate, UserEntity,
    UserEntityCreateUpdate,
};
use eduportal::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use eduportal::web::{AuthenticatedUser, UserRole};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the EduPortal DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage programs
    Program {
        #[command(subcommand)]
        action: ProgramCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage topics
    Topic {
        #[command(subcommand)]
        action: TopicCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        /// `learner` or `admin`
        #[arg(long, default_value = "learner")]
        role: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProgramCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        instructor: String,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        /// Program title to attach the module to
        #[arg(long)]
        program_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 1)]
        position: i32,
    },
}

#[derive(Subcommand, Debug)]
pub enum TopicCommands {
    Add {
        /// Module title to attach the topic to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 1)]
        position: i32,
    },
}

async fn id_by_title(mm: &ModelManager, table: &str, title: &str) -> Result<Uuid, DatabaseError> {
    let id = sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE title = $1 LIMIT 1"))
        .bind(title)
        .fetch_one(mm.executor())
        .await?;
    Ok(id)
}

#[tokio::main]
async fn main() -> eduportal::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let config = eduportal::Config::get_or_init(true).await;
    let db_con = DbConnection::connect(config.app().database_uri())?;
    db_con.migrate().await?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                email,
                password,
                first_name,
                last_name,
                role,
            } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        email,
                        first_name,
                        last_name,
                        password_hash: eduportal::auth::hash_password(&password)?,
                        role: UserRole::from(role.as_str()),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Program { action } => match action {
            ProgramCommands::Add {
                title,
                description,
                category,
                instructor,
                price,
            } => {
                let program = Program::create(
                    &mm,
                    &actor,
                    ProgramCreate {
                        title,
                        description,
                        category,
                        instructor,
                        instructor_avatar: None,
                        image: None,
                        level: None,
                        price,
                        rating: None,
                        is_active: Some(true),
                    },
                )
                .await?;
                println!("Program created: {:?}", program);
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add {
                program_title,
                title,
                description,
                position,
            } => {
                let program_id = id_by_title(&mm, "programs", &program_title).await?;
                let program = Program::find_by_id(&mm, &actor, program_id)
                    .await?
                    .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))?;

                let module = Module::create(
                    &mm,
                    &actor,
                    ModuleCreate {
                        title,
                        description,
                        prerequisite_module_id: None,
                    },
                )
                .await?;
                program.attach_module(&mm, module.id(), position).await?;
                println!("Module created: {:?}", module);
            }
        },

        Commands::Topic { action } => match action {
            TopicCommands::Add {
                module_title,
                title,
                description,
                position,
            } => {
                let module_id = id_by_title(&mm, "modules", &module_title).await?;
                let module = Module::find_by_id(&mm, &actor, module_id)
                    .await?
                    .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))?;

                let topic = Topic::create(&mm, &actor, TopicCreate { title, description }).await?;
                module.attach_topic(&mm, topic.id(), position).await?;
                println!("Topic created: {:?}", topic);
            }
        },
    }

    Ok(())
}
