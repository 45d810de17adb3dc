use anyhow::Result;
use vmctl::{
    supervisor::VmStatus,
    utils::size::format_memory_mib,
    vm::conf::{KEY_CPU_COUNT, KEY_MEMORY_SIZE},
};

use crate::{
    context::Context,
    ui::{
        message::message_info,
        table::{STATUS_RUNNING, STATUS_STOPPED, Table, TableCellStyle, TableHeader},
    },
};

#[derive(Debug, Clone)]
pub struct VmTableRow {
    pub name: String,
    pub status: String,
    pub cpus: Option<String>,
    pub memory: Option<String>,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VmTable {
    rows: Vec<VmTableRow>,
}

impl VmTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: VmTableRow) {
        self.rows.push(row);
    }

    pub fn print(self) {
        let table = Table::from(self);
        table.print();
    }
}

impl From<VmTable> for Table {
    fn from(table: VmTable) -> Self {
        Self {
            headers: vec![
                TableHeader::new("name", TableCellStyle::Default),
                TableHeader::new("status", TableCellStyle::Status),
                TableHeader::new("cpus", TableCellStyle::Default),
                TableHeader::new("memory", TableCellStyle::Default),
                TableHeader::new("ip", TableCellStyle::Important),
            ],
            rows: table
                .rows
                .into_iter()
                .map(|row| {
                    vec![
                        Some(row.name),
                        Some(row.status),
                        row.cpus,
                        row.memory,
                        row.ip,
                    ]
                })
                .collect(),
        }
    }
}

impl From<VmStatus> for VmTableRow {
    fn from(status: VmStatus) -> Self {
        let conf = status.conf.as_ref();
        let memory = conf
            .and_then(|c| c.get(KEY_MEMORY_SIZE))
            .map(|m| match m.parse::<u64>() {
                Ok(mib) => format_memory_mib(mib),
                Err(_) => m.to_string(),
            });

        Self {
            name: status.name,
            status: if status.running {
                STATUS_RUNNING.to_string()
            } else {
                STATUS_STOPPED.to_string()
            },
            cpus: conf.and_then(|c| c.get(KEY_CPU_COUNT)).map(str::to_string),
            memory,
            ip: status.ip,
        }
    }
}

pub async fn run_list(ctx: &Context) -> Result<()> {
    let statuses = ctx.supervisor.list(&ctx.registry).await?;

    if statuses.is_empty() {
        message_info(format!(
            "No vms in {}",
            ctx.registry.root().display()
        ));
        return Ok(());
    }

    let mut table = VmTable::new();
    for status in statuses {
        table.add_row(status.into());
    }
    table.print();

    Ok(())
}
